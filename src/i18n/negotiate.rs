//! Language negotiation: from request signals to a loaded language.
//!
//! Two kinds of input exist:
//!
//! - a weighted preference list (`Accept-Language: zh;q=0.9, en;q=0.8`),
//!   ranked and matched against the loaded languages;
//! - a single tag from a cookie, query parameter or form field, only parsed.
//!
//! Providers are tried in order and the first that yields a tag wins. When
//! none does, the caller falls back to the default language.

use crate::i18n::LanguageTag;
use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_HEADER_NAME: &str = "Accept-Language";
pub const DEFAULT_LANGUAGE_KEY: &str = "lang";

/// A candidate from a weighted preference list.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTag {
    pub tag: LanguageTag,
    pub weight: f32,
}

/// Parse an `Accept-Language` style value, best first.
///
/// Entries with `q=0`, the `*` wildcard and tags that do not parse are
/// dropped. Equal weights keep their input order.
pub fn parse_accept_language(raw: &str) -> Vec<WeightedTag> {
    let mut ranked: Vec<WeightedTag> = accept_language::parse_with_quality(raw)
        .into_iter()
        .filter(|(tag, weight)| tag != "*" && *weight > 0.0 && *weight <= 1.0)
        .filter_map(|(tag, weight)| {
            let tag = LanguageTag::parse(&tag).ok()?;
            Some(WeightedTag { tag, weight })
        })
        .collect();

    // sort_by is stable, so ties stay in input order
    ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    ranked
}

/// First ranked candidate that matches a loaded language.
///
/// Each candidate is looked up in turn: an exact match first, then a loaded
/// tag that covers it (`en` for `en-GB`), then one it covers.
pub fn match_known(ranked: &[WeightedTag], known: &HashSet<LanguageTag>) -> Option<LanguageTag> {
    let requested: Vec<&LanguageTag> = ranked.iter().map(|candidate| &candidate.tag).collect();
    let mut available: Vec<&LanguageTag> = known.iter().collect();
    available.sort_by_key(|tag| tag.to_string());

    let matched = negotiate_languages(&requested, &available, None, NegotiationStrategy::Lookup)
        .first()
        .map(|tag| (**tag).clone());
    matched
}

/// Where a transport keeps the raw language signals of one request.
pub trait LanguageSignals {
    fn header(&self, name: &str) -> Option<String>;
    fn cookie(&self, name: &str) -> Option<String>;
    fn query(&self, name: &str) -> Option<String>;
    fn form(&self, name: &str) -> Option<String>;
}

/// In-memory signals, for callers without an HTTP request.
#[derive(Debug, Clone, Default)]
pub struct SignalMap {
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
}

impl SignalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are matched case-insensitively.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }
}

impl LanguageSignals for SignalMap {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn query(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn form(&self, name: &str) -> Option<String> {
        self.form.get(name).cloned()
    }
}

/// One source of a language preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageProvider {
    /// Weighted list in the configured header, matched against loaded languages.
    Header,
    /// Single tag in the cookie named by the language key.
    Cookie,
    /// Single tag in the query parameter named by the language key.
    Query,
    /// Single tag in the form field named by the language key.
    Form,
}

impl LanguageProvider {
    pub const DEFAULT_ORDER: [LanguageProvider; 4] = [
        LanguageProvider::Header,
        LanguageProvider::Cookie,
        LanguageProvider::Query,
        LanguageProvider::Form,
    ];

    fn provide(
        &self,
        signals: &dyn LanguageSignals,
        negotiator: &Negotiator,
        known: &HashSet<LanguageTag>,
    ) -> Option<LanguageTag> {
        let key = negotiator.language_key.as_str();
        let single = match self {
            LanguageProvider::Header => {
                let raw = signals.header(&negotiator.header_name)?;
                return match_known(&parse_accept_language(&raw), known);
            }
            LanguageProvider::Cookie => signals.cookie(key),
            LanguageProvider::Query => signals.query(key),
            LanguageProvider::Form => signals.form(key),
        };
        parse_single(single?.as_str())
    }
}

fn parse_single(raw: &str) -> Option<LanguageTag> {
    if raw.trim().is_empty() {
        return None;
    }
    LanguageTag::parse(raw).ok()
}

/// Tries the configured providers in order.
#[derive(Debug, Clone)]
pub struct Negotiator {
    providers: Vec<LanguageProvider>,
    language_key: String,
    header_name: String,
}

impl Default for Negotiator {
    fn default() -> Self {
        Self {
            providers: LanguageProvider::DEFAULT_ORDER.to_vec(),
            language_key: DEFAULT_LANGUAGE_KEY.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
        }
    }
}

impl Negotiator {
    pub fn new(
        providers: Vec<LanguageProvider>,
        language_key: impl Into<String>,
        header_name: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            language_key: language_key.into(),
            header_name: header_name.into(),
        }
    }

    pub fn providers(&self) -> &[LanguageProvider] {
        &self.providers
    }

    pub fn language_key(&self) -> &str {
        &self.language_key
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// The first provider's answer, or `None` when every provider is silent.
    pub fn resolve(
        &self,
        signals: &dyn LanguageSignals,
        known: &HashSet<LanguageTag>,
    ) -> Option<LanguageTag> {
        self.providers
            .iter()
            .find_map(|provider| provider.provide(signals, self, known))
    }
}
