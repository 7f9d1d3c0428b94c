//! Per-language rendering with default-language fallback.
//!
//! A [`Localizer`] is a merged view of the catalog for one requested
//! language: its own definitions layered over the default language's. Each
//! entry remembers which language it came from so that plural categories are
//! chosen with the rules of the language the text is written in.

use crate::i18n::catalog::Catalog;
use crate::i18n::plural::{PluralCount, PluralSelector};
use crate::i18n::{
    I18nError, LanguageTag, MessageDefinition, PluralCategory, TemplateData, Untranslated,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Template value name that carries the plural count.
pub const PLURAL_COUNT_KEY: &str = "PluralCount";

/// A structured translation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationRequest {
    pub message_id: String,
    pub template_data: Option<TemplateData>,
    pub plural_count: Option<PluralCount>,
}

impl TranslationRequest {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: TemplateData) -> Self {
        self.template_data = Some(data);
        self
    }

    /// Add a single template value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_data
            .get_or_insert_with(TemplateData::new)
            .insert(name, value);
        self
    }

    pub fn with_count(mut self, count: impl Into<PluralCount>) -> Self {
        self.plural_count = Some(count.into());
        self
    }
}

/// What callers may ask to translate.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRequest {
    /// Just a message id, rendered without data or count.
    Id(String),
    Request(TranslationRequest),
}

impl MessageRequest {
    pub fn message_id(&self) -> &str {
        match self {
            MessageRequest::Id(id) => id,
            MessageRequest::Request(request) => &request.message_id,
        }
    }
}

impl From<&str> for MessageRequest {
    fn from(id: &str) -> Self {
        MessageRequest::Id(id.to_string())
    }
}

impl From<String> for MessageRequest {
    fn from(id: String) -> Self {
        MessageRequest::Id(id)
    }
}

impl From<TranslationRequest> for MessageRequest {
    fn from(request: TranslationRequest) -> Self {
        MessageRequest::Request(request)
    }
}

/// Requests arriving as JSON: either a bare id string or an object with
/// `messageId`, optional `templateData` and optional `pluralCount`.
impl TryFrom<Value> for MessageRequest {
    type Error = I18nError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(id) => Ok(MessageRequest::Id(id)),
            Value::Object(mut map) => {
                let id = match map.remove("messageId") {
                    Some(Value::String(id)) => id,
                    _ => {
                        return Err(I18nError::UnsupportedRequestShape(
                            "object without a string 'messageId'".to_string(),
                        ))
                    }
                };
                let mut request = TranslationRequest::new(id);
                match map.remove("templateData") {
                    Some(Value::Object(data)) => request.template_data = Some(data.into()),
                    None | Some(Value::Null) => {}
                    Some(_) => {
                        return Err(I18nError::UnsupportedRequestShape(
                            "'templateData' must be an object".to_string(),
                        ))
                    }
                }
                match map.remove("pluralCount") {
                    Some(Value::Number(n)) => request.plural_count = Some(n.to_string().into()),
                    Some(Value::String(s)) => request.plural_count = Some(s.into()),
                    None | Some(Value::Null) => {}
                    Some(_) => {
                        return Err(I18nError::UnsupportedRequestShape(
                            "'pluralCount' must be a number or string".to_string(),
                        ))
                    }
                }
                Ok(MessageRequest::Request(request))
            }
            Value::Null => Err(unsupported("null")),
            Value::Bool(_) => Err(unsupported("boolean")),
            Value::Number(_) => Err(unsupported("number")),
            Value::Array(_) => Err(unsupported("array")),
        }
    }
}

fn unsupported(kind: &str) -> I18nError {
    I18nError::UnsupportedRequestShape(format!("a {} is not a message id or request", kind))
}

#[derive(Debug, Clone)]
struct Entry {
    definition: Arc<MessageDefinition>,
    from_default: bool,
}

/// Merged, read-only view of one language with default-language fallback.
#[derive(Debug)]
pub struct Localizer {
    language: LanguageTag,
    default_language: LanguageTag,
    entries: BTreeMap<String, Entry>,
    rules: PluralSelector,
    default_rules: PluralSelector,
}

impl Localizer {
    /// Build the view for `language` out of `catalog`.
    pub fn build(catalog: &Catalog, language: &LanguageTag) -> Localizer {
        let default_language = catalog.default_language().clone();
        let mut entries = BTreeMap::new();

        if let Some(messages) = catalog.messages(&default_language) {
            for (id, definition) in messages {
                entries.insert(
                    id.clone(),
                    Entry {
                        definition: definition.clone(),
                        from_default: true,
                    },
                );
            }
        }

        if *language != default_language {
            if let Some(messages) = catalog.messages(language) {
                for (id, definition) in messages {
                    entries.insert(
                        id.clone(),
                        Entry {
                            definition: definition.clone(),
                            from_default: false,
                        },
                    );
                }
            }
        }

        Localizer {
            language: language.clone(),
            rules: PluralSelector::for_language(language),
            default_rules: PluralSelector::for_language(&default_language),
            default_language,
            entries,
        }
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `id` is only available through the default language.
    pub fn is_fallback(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .map(|entry| entry.from_default && self.language != self.default_language)
            .unwrap_or(false)
    }

    /// Render `request`.
    ///
    /// Failures yield [`Untranslated`] carrying the message id as text.
    /// Missing template values are not failures; they render as
    /// [`NO_VALUE`](crate::i18n::template::NO_VALUE).
    pub fn localize(&self, request: &MessageRequest) -> Result<String, Untranslated> {
        let (id, data, count) = match request {
            MessageRequest::Id(id) => (id.as_str(), None, None),
            MessageRequest::Request(request) => (
                request.message_id.as_str(),
                request.template_data.as_ref(),
                request.plural_count.as_ref(),
            ),
        };

        let entry = self.entries.get(id).ok_or_else(|| {
            Untranslated::new(
                id,
                I18nError::MessageNotFound {
                    id: id.to_string(),
                    language: self.language.clone(),
                },
            )
        })?;

        let category = match count {
            Some(count) => {
                let rules = if entry.from_default {
                    &self.default_rules
                } else {
                    &self.rules
                };
                rules.select(count).map_err(|e| Untranslated::new(id, e))?
            }
            None => PluralCategory::Other,
        };

        let Some(template) = entry.definition.select(category) else {
            return Ok(id.to_string());
        };

        let rendered = match count {
            Some(count) if !data.is_some_and(|d| d.contains(PLURAL_COUNT_KEY)) => {
                let mut data = data.cloned().unwrap_or_default();
                data.insert(PLURAL_COUNT_KEY, count.as_str());
                template.render(&data)
            }
            _ => match data {
                Some(data) => template.render(data),
                None => template.render(&TemplateData::new()),
            },
        };

        if rendered.is_empty() {
            return Ok(id.to_string());
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::catalog::CatalogBuilder;
    use crate::i18n::format::FormatRegistry;
    use crate::i18n::source::{Loader, MemorySource};
    use serde_json::json;

    fn tag(raw: &str) -> LanguageTag {
        LanguageTag::parse(raw).unwrap()
    }

    fn catalog() -> Catalog {
        let source = MemorySource::new()
            .with_file(
                "app.en.json",
                json!({
                    "Hello": "hello",
                    "OnlyDefault": "default text",
                    "Cats": {"one": "{{.Name}} has {{.PluralCount}} cat", "other": "{{.Name}} has {{.PluralCount}} cats"},
                    "Empty": ""
                })
                .to_string(),
            )
            .with_file(
                "app.uk.json",
                json!({
                    "Hello": "привіт",
                    "Cats": {"one": "один кіт", "few": "{{.PluralCount}} коти", "many": "{{.PluralCount}} котів", "other": "котів"}
                })
                .to_string(),
            );
        let mut builder = CatalogBuilder::new(tag("en"), FormatRegistry::with_builtins());
        builder.add_source(&Loader::new(source)).unwrap();
        builder.build().unwrap()
    }

    fn localize(lang: &str, request: impl Into<MessageRequest>) -> Result<String, Untranslated> {
        Localizer::build(&catalog(), &tag(lang)).localize(&request.into())
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_plain_id() {
        assert_eq!(localize("en", "Hello").unwrap(), "hello");
        assert_eq!(localize("uk", "Hello").unwrap(), "привіт");
    }

    #[test]
    fn test_fallback_to_default_language() {
        let localizer = Localizer::build(&catalog(), &tag("uk"));
        assert!(localizer.is_fallback("OnlyDefault"));
        assert!(!localizer.is_fallback("Hello"));
        assert_eq!(
            localizer.localize(&"OnlyDefault".into()).unwrap(),
            "default text"
        );
    }

    #[test]
    fn test_missing_id_returns_id_and_error() {
        let err = localize("uk", "Nope").unwrap_err();
        assert_eq!(err.text, "Nope");
        assert!(matches!(err.error, I18nError::MessageNotFound { .. }));
    }

    #[test]
    fn test_empty_text_degrades_to_id() {
        assert_eq!(localize("en", "Empty").unwrap(), "Empty");
    }

    #[test]
    fn test_default_localizer_only_has_default_entries() {
        let localizer = Localizer::build(&catalog(), &tag("en"));
        assert_eq!(localizer.len(), 4);
        assert!(!localizer.is_fallback("OnlyDefault"));
    }

    // ==================== Plural Tests ====================

    #[test]
    fn test_english_plural_selection() {
        let one = TranslationRequest::new("Cats").with_value("Name", "Nick").with_count(1);
        let zero = TranslationRequest::new("Cats").with_value("Name", "Nick").with_count(0);
        let two = TranslationRequest::new("Cats").with_value("Name", "Nick").with_count(2);
        assert_eq!(localize("en", one).unwrap(), "Nick has 1 cat");
        assert_eq!(localize("en", zero).unwrap(), "Nick has 0 cats");
        assert_eq!(localize("en", two).unwrap(), "Nick has 2 cats");
    }

    #[test]
    fn test_ukrainian_plural_selection() {
        assert_eq!(localize("uk", TranslationRequest::new("Cats").with_count(1)).unwrap(), "один кіт");
        assert_eq!(localize("uk", TranslationRequest::new("Cats").with_count(3)).unwrap(), "3 коти");
        assert_eq!(localize("uk", TranslationRequest::new("Cats").with_count(5)).unwrap(), "5 котів");
    }

    #[test]
    fn test_plural_message_without_count_uses_other() {
        assert_eq!(localize("en", "Cats").unwrap(), "<no value> has <no value> cats");
    }

    #[test]
    fn test_fallback_message_uses_default_language_rules() {
        // "lv" has no messages, so "Cats" comes from English and 1 must be "one"
        let localizer = Localizer::build(&catalog(), &tag("lv"));
        let request = TranslationRequest::new("Cats").with_value("Name", "Ann").with_count(1);
        assert_eq!(localizer.localize(&request.into()).unwrap(), "Ann has 1 cat");
    }

    #[test]
    fn test_explicit_plural_count_value_is_kept() {
        let request = TranslationRequest::new("Cats")
            .with_value("Name", "Nick")
            .with_value(PLURAL_COUNT_KEY, "one")
            .with_count(1);
        assert_eq!(localize("en", request).unwrap(), "Nick has one cat");
    }

    #[test]
    fn test_invalid_count_returns_id() {
        let err = localize("en", TranslationRequest::new("Cats").with_count("lots")).unwrap_err();
        assert_eq!(err.text, "Cats");
        assert!(matches!(err.error, I18nError::InvalidPluralCount(_)));
    }

    // ==================== Request Shape Tests ====================

    #[test]
    fn test_request_from_json_string() {
        let request = MessageRequest::try_from(json!("Hello")).unwrap();
        assert_eq!(request, MessageRequest::Id("Hello".to_string()));
    }

    #[test]
    fn test_request_from_json_object() {
        let request = MessageRequest::try_from(json!({
            "messageId": "Cats",
            "templateData": {"Name": "Nick"},
            "pluralCount": 2
        }))
        .unwrap();
        let MessageRequest::Request(request) = request else {
            panic!("Expected structured request");
        };
        assert_eq!(request.message_id, "Cats");
        assert_eq!(request.plural_count, Some(PluralCount::from(2)));
        assert!(request.template_data.unwrap().contains("Name"));
    }

    #[test]
    fn test_request_unsupported_shapes() {
        for value in [json!(42), json!(null), json!([1]), json!(true), json!({"id": "x"})] {
            let err = MessageRequest::try_from(value).unwrap_err();
            assert!(matches!(err, I18nError::UnsupportedRequestShape(_)));
        }
    }

    #[test]
    fn test_request_message_id() {
        assert_eq!(MessageRequest::from("Hello").message_id(), "Hello");
        assert_eq!(
            MessageRequest::from(TranslationRequest::new("Cats")).message_id(),
            "Cats"
        );
    }
}
