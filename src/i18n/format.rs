//! Format registry: file extension to decoder.
//!
//! A decoder turns raw file bytes into a `serde_json::Value` document which
//! [`collect_entries`](crate::i18n::message::collect_entries) then reads
//! messages from. `json` is always registered. `yaml`, `yml` and `toml` are
//! registered on demand the first time a walker meets such a file, unless the
//! caller already registered their own decoder for that tag.

use crate::i18n::message::{collect_entries, RawMessageEntry};
use crate::i18n::{BoxError, I18nError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Decoder from file bytes to a generic document.
pub type UnmarshalFn = Arc<dyn Fn(&[u8]) -> Result<Value, BoxError> + Send + Sync>;

/// Wrap a closure or function as an [`UnmarshalFn`].
pub fn unmarshal_fn<F>(f: F) -> UnmarshalFn
where
    F: Fn(&[u8]) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn json_unmarshal(bytes: &[u8]) -> Result<Value, BoxError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn yaml_unmarshal(bytes: &[u8]) -> Result<Value, BoxError> {
    Ok(serde_yaml::from_slice(bytes)?)
}

pub fn toml_unmarshal(bytes: &[u8]) -> Result<Value, BoxError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(toml::from_str(text)?)
}

/// Decoder for a format tag that is known without registration.
fn well_known(format: &str) -> Option<UnmarshalFn> {
    match format {
        "json" => Some(unmarshal_fn(json_unmarshal)),
        "yaml" | "yml" => Some(unmarshal_fn(yaml_unmarshal)),
        "toml" => Some(unmarshal_fn(toml_unmarshal)),
        _ => None,
    }
}

#[derive(Clone, Default)]
pub struct FormatRegistry {
    decoders: HashMap<String, UnmarshalFn>,
}

impl FormatRegistry {
    /// Empty registry; nothing is decodable until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `json` decoder.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("json", unmarshal_fn(json_unmarshal));
        registry
    }

    /// Register (or replace) the decoder for `format`.
    pub fn register(&mut self, format: impl Into<String>, decoder: UnmarshalFn) {
        let format = format.into().to_ascii_lowercase();
        debug!("Registered decoder for '{}' files", format);
        self.decoders.insert(format, decoder);
    }

    pub fn is_registered(&self, format: &str) -> bool {
        self.decoders.contains_key(&format.to_ascii_lowercase())
    }

    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.decoders.keys().cloned().collect();
        formats.sort();
        formats
    }

    /// Make sure `format` is decodable, registering a well-known decoder if
    /// none is present. Returns whether the tag can now be decoded.
    pub fn ensure_well_known(&mut self, format: &str) -> bool {
        if self.is_registered(format) {
            return true;
        }
        match well_known(&format.to_ascii_lowercase()) {
            Some(decoder) => {
                self.register(format, decoder);
                true
            }
            None => false,
        }
    }

    /// Decode `bytes` as `format` and collect the message entries by id.
    ///
    /// Duplicate ids inside one file keep the later entry.
    pub fn parse(
        &self,
        format: &str,
        path: &str,
        bytes: &[u8],
    ) -> Result<BTreeMap<String, RawMessageEntry>, I18nError> {
        let decoder = self
            .decoders
            .get(&format.to_ascii_lowercase())
            .ok_or_else(|| I18nError::UnsupportedFormat {
                format: format.to_string(),
                path: path.to_string(),
            })?;

        let malformed = |reason: String| I18nError::MalformedMessageFile {
            path: path.to_string(),
            format: format.to_string(),
            reason,
        };

        let document = decoder(bytes).map_err(|e| malformed(e.to_string()))?;
        let entries = collect_entries(document).map_err(malformed)?;
        Ok(entries.into_iter().collect())
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Registration Tests ====================

    #[test]
    fn test_builtins_have_json_only() {
        let registry = FormatRegistry::with_builtins();
        assert!(registry.is_registered("json"));
        assert!(!registry.is_registered("yaml"));
        assert_eq!(registry.formats(), vec!["json"]);
    }

    #[test]
    fn test_ensure_well_known_registers_yaml_and_toml() {
        let mut registry = FormatRegistry::with_builtins();
        assert!(registry.ensure_well_known("yaml"));
        assert!(registry.ensure_well_known("yml"));
        assert!(registry.ensure_well_known("toml"));
        assert!(registry.is_registered("yaml"));
        assert!(registry.is_registered("toml"));
    }

    #[test]
    fn test_ensure_well_known_unknown_format() {
        let mut registry = FormatRegistry::with_builtins();
        assert!(!registry.ensure_well_known("ini"));
        assert!(!registry.is_registered("ini"));
    }

    #[test]
    fn test_explicit_registration_wins_over_well_known() {
        let mut registry = FormatRegistry::with_builtins();
        registry.register(
            "yaml",
            unmarshal_fn(|_| Ok(serde_json::json!({"Custom": "custom"}))),
        );
        assert!(registry.ensure_well_known("yaml"));

        let entries = registry.parse("yaml", "a.en.yaml", b"Hello: hello").unwrap();
        assert!(entries.contains_key("Custom"));
        assert!(!entries.contains_key("Hello"));
    }

    #[test]
    fn test_format_tags_case_insensitive() {
        let registry = FormatRegistry::with_builtins();
        assert!(registry.is_registered("JSON"));
    }

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_json() {
        let registry = FormatRegistry::with_builtins();
        let entries = registry
            .parse("json", "hello.en.json", br#"{"Hello":"hello"}"#)
            .unwrap();
        assert_eq!(
            entries.get("Hello"),
            Some(&RawMessageEntry::Text("hello".to_string()))
        );
    }

    #[test]
    fn test_parse_yaml_plural() {
        let mut registry = FormatRegistry::with_builtins();
        registry.ensure_well_known("yaml");
        let yaml = "Cats:\n  one: a cat\n  other: \"{{.Count}} cats\"\n";
        let entries = registry.parse("yaml", "cats.en.yaml", yaml.as_bytes()).unwrap();
        assert!(matches!(entries.get("Cats"), Some(RawMessageEntry::Structured(_))));
    }

    #[test]
    fn test_parse_toml() {
        let mut registry = FormatRegistry::with_builtins();
        registry.ensure_well_known("toml");
        let toml = "Hello = \"你好\"\n\n[Cats]\nother = \"猫\"\n";
        let entries = registry.parse("toml", "zh.toml", toml.as_bytes()).unwrap();
        assert_eq!(
            entries.get("Hello"),
            Some(&RawMessageEntry::Text("你好".to_string()))
        );
        assert!(entries.contains_key("Cats"));
    }

    #[test]
    fn test_parse_unregistered_format() {
        let registry = FormatRegistry::with_builtins();
        let err = registry.parse("ini", "hello.en.ini", b"").unwrap_err();
        assert!(matches!(err, I18nError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_parse_malformed_json() {
        let registry = FormatRegistry::with_builtins();
        let err = registry.parse("json", "hello.en.json", b"{not json").unwrap_err();
        match err {
            I18nError::MalformedMessageFile { path, format, .. } => {
                assert_eq!(path, "hello.en.json");
                assert_eq!(format, "json");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_wrong_shape() {
        let registry = FormatRegistry::with_builtins();
        let err = registry.parse("json", "hello.en.json", b"[1, 2]").unwrap_err();
        assert!(matches!(err, I18nError::MalformedMessageFile { .. }));
    }
}
