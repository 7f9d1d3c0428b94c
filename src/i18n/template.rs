//! Message templates with `{{.Name}}` placeholders.
//!
//! Templates are parsed once when a message file is loaded. Only field
//! references are recognized (`{{.Name}}`, `{{ .User.Name }}`); any other
//! text between the delimiters is kept verbatim. A placeholder without a
//! value renders as [`NO_VALUE`] instead of failing the whole message.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Rendered in place of a placeholder that has no value.
pub const NO_VALUE: &str = "<no value>";

pub const DEFAULT_LEFT_DELIM: &str = "{{";
pub const DEFAULT_RIGHT_DELIM: &str = "}}";

static DEFAULT_PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Named values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateData(Map<String, Value>);

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve a dotted path (`User.Name`) through nested objects.
    pub fn lookup(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.0.get(first)?;
        for key in rest {
            value = value.as_object()?.get(key)?;
        }
        Some(value)
    }
}

impl From<Map<String, Value>> for TemplateData {
    fn from(map: Map<String, Value>) -> Self {
        TemplateData(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TemplateData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TemplateData(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Vec<String>),
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse with the default `{{` / `}}` delimiters.
    pub fn parse(source: &str) -> Template {
        let regex = DEFAULT_PLACEHOLDER_REGEX
            .get_or_init(|| placeholder_regex(DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM));
        Template::parse_with(source, regex)
    }

    /// Parse with custom delimiters (e.g. `[[` / `]]`).
    pub fn parse_with_delims(source: &str, left: &str, right: &str) -> Template {
        if left == DEFAULT_LEFT_DELIM && right == DEFAULT_RIGHT_DELIM {
            return Template::parse(source);
        }
        Template::parse_with(source, &placeholder_regex(left, right))
    }

    fn parse_with(source: &str, regex: &Regex) -> Template {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in regex.captures_iter(source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            segments.push(Segment::Field(
                path.as_str().split('.').map(str::to_string).collect(),
            ));
            last = whole.end();
        }

        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Template {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all referenced fields, dotted, in order of appearance.
    pub fn placeholders(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(path) => Some(path.join(".")),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute `data` into the template.
    pub fn render(&self, data: &TemplateData) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(path) => match data.lookup(path) {
                    Some(value) => out.push_str(&stringify(value)),
                    None => {
                        debug!("No value for placeholder '{}'", path.join("."));
                        out.push_str(NO_VALUE);
                    }
                },
            }
        }
        out
    }
}

fn placeholder_regex(left: &str, right: &str) -> Regex {
    let pattern = format!(
        r"{}\s*\.([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*{}",
        regex::escape(left),
        regex::escape(right)
    );
    Regex::new(&pattern).expect("delimiters are escaped")
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NO_VALUE.to_string(),
        other => other.to_string(),
    }
}
