//! Language type: validated, immutable BCP-47 tags.
//!
//! `LanguageTag` wraps a `unic_langid::LanguageIdentifier` and adds the one
//! rule message file names rely on: the primary language subtag must be a
//! registered ISO 639-1 or ISO 639-3 code. That rule is what turns
//! `hello.json` or `faq.json` into a malformed file name instead of a file
//! for the "hello" or "faq" language.

use crate::i18n::I18nError;
use isolang::Language;
use std::fmt;
use std::str::FromStr;
use unic_langid::LanguageIdentifier;

/// A validated language tag.
///
/// Equality is exact tag equality (`en` != `en-US`); closeness is the
/// negotiator's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    id: LanguageIdentifier,
}

impl LanguageTag {
    /// Parse and normalize a tag (e.g. `en_us` becomes `en-US`).
    ///
    /// # Returns
    /// * `Ok(LanguageTag)` for a well-formed tag with a registered language
    /// * `Err(I18nError::InvalidLanguageTag)` otherwise
    pub fn parse(raw: &str) -> Result<LanguageTag, I18nError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid(raw, "empty tag"));
        }

        let id: LanguageIdentifier = trimmed
            .parse()
            .map_err(|e| invalid(raw, &format!("{}", e)))?;

        let language = id.language.as_str();
        if !(2..=3).contains(&language.len()) || language == "und" {
            return Err(invalid(raw, "primary language must be a 2-3 letter code"));
        }
        if !is_registered(language) {
            return Err(invalid(raw, "primary language is not an ISO 639 code"));
        }

        Ok(LanguageTag { id })
    }

    /// The language-only form of this tag (`zh-Hans-CN` becomes `zh`).
    pub fn primary(&self) -> LanguageTag {
        LanguageTag {
            id: LanguageIdentifier::from_parts(self.id.language, None, None, &[]),
        }
    }

    /// Whether the tag carries nothing but a language subtag.
    pub fn is_primary(&self) -> bool {
        self.id.script.is_none() && self.id.region.is_none() && self.id.variants().next().is_none()
    }

    /// The primary language subtag (e.g. "en").
    pub fn language(&self) -> &str {
        self.id.language.as_str()
    }

    pub fn as_langid(&self) -> &LanguageIdentifier {
        &self.id
    }
}

fn is_registered(language: &str) -> bool {
    match language.len() {
        2 => Language::from_639_1(language).is_some(),
        _ => Language::from_639_3(language).is_some(),
    }
}

fn invalid(raw: &str, reason: &str) -> I18nError {
    I18nError::InvalidLanguageTag {
        tag: raw.to_string(),
        reason: reason.to_string(),
    }
}

impl AsRef<LanguageIdentifier> for LanguageTag {
    fn as_ref(&self) -> &LanguageIdentifier {
        &self.id
    }
}

impl FromStr for LanguageTag {
    type Err = I18nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::parse(s)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl From<LanguageTag> for LanguageIdentifier {
    fn from(tag: LanguageTag) -> Self {
        tag.id
    }
}
