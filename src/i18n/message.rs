//! Message definitions and the generic message-file layout.
//!
//! Every format decoder produces a `serde_json::Value`; this module turns
//! that document into message entries. A file is either a map or an array:
//!
//! ```json
//! {
//!   "Hello": "hello",
//!   "PersonCats": { "one": "{{.Name}} has a cat", "other": "{{.Name}} has cats" },
//!   "errors": { "notFound": "not found" }
//! }
//! ```
//!
//! A map value that holds a reserved key (`id`, `description`, `hash`,
//! `leftDelim`, `rightDelim` or a plural category) with a string value is a
//! message. Any other map is a namespace and its children get dotted ids
//! (`errors.notFound`).

use crate::i18n::template::{Template, DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM};
use crate::i18n::PluralCategory;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const RESERVED_KEYS: [&str; 11] = [
    "id",
    "description",
    "hash",
    "leftdelim",
    "rightdelim",
    "zero",
    "one",
    "two",
    "few",
    "many",
    "other",
];

/// Structured form of a message entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredEntry {
    pub id: Option<String>,
    pub description: Option<String>,
    pub hash: Option<String>,
    pub left_delim: Option<String>,
    pub right_delim: Option<String>,
    pub variants: BTreeMap<PluralCategory, String>,
}

/// One message as it appears in a file, before templates are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessageEntry {
    Text(String),
    Structured(StructuredEntry),
}

/// A loaded message: metadata plus one parsed template per plural category.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    pub id: String,
    pub description: Option<String>,
    pub hash: Option<String>,
    variants: BTreeMap<PluralCategory, Template>,
}

impl MessageDefinition {
    pub fn from_raw(id: impl Into<String>, raw: RawMessageEntry) -> MessageDefinition {
        let id = id.into();
        match raw {
            RawMessageEntry::Text(text) => MessageDefinition {
                id,
                description: None,
                hash: None,
                variants: BTreeMap::from([(PluralCategory::Other, Template::parse(&text))]),
            },
            RawMessageEntry::Structured(entry) => {
                let left = entry.left_delim.as_deref().unwrap_or(DEFAULT_LEFT_DELIM);
                let right = entry.right_delim.as_deref().unwrap_or(DEFAULT_RIGHT_DELIM);
                let variants = entry
                    .variants
                    .iter()
                    .map(|(category, text)| {
                        (*category, Template::parse_with_delims(text, left, right))
                    })
                    .collect();
                MessageDefinition {
                    id,
                    description: entry.description,
                    hash: entry.hash,
                    variants,
                }
            }
        }
    }

    /// The `other` template, the text used when no count is given.
    pub fn other(&self) -> Option<&Template> {
        self.variants.get(&PluralCategory::Other)
    }

    pub fn variant(&self, category: PluralCategory) -> Option<&Template> {
        self.variants.get(&category)
    }

    /// Template for `category`, falling back to `other`, then to any variant.
    pub fn select(&self, category: PluralCategory) -> Option<&Template> {
        self.variant(category)
            .or_else(|| self.other())
            .or_else(|| self.variants.values().next())
    }

    pub fn categories(&self) -> impl Iterator<Item = PluralCategory> + '_ {
        self.variants.keys().copied()
    }

    /// Placeholder names used by any variant, deduplicated and sorted.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .variants
            .values()
            .flat_map(|template| template.placeholders())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Collect the messages of a decoded document.
///
/// Object keys come out sorted, as `serde_json::Map` iterates them; array
/// items keep their order.
///
/// Returns an error message when the document has a shape that cannot hold
/// messages (e.g. a bare string or number).
pub fn collect_entries(document: Value) -> Result<Vec<(String, RawMessageEntry)>, String> {
    let mut out = Vec::new();
    match document {
        Value::Object(map) => collect_map(None, map, &mut out)?,
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                let Value::Object(map) = item else {
                    return Err(format!("array item {} is not a message object", index));
                };
                let entry = structured(&map)?;
                let id = entry
                    .id
                    .clone()
                    .ok_or_else(|| format!("array item {} has no id", index))?;
                out.push((id, RawMessageEntry::Structured(entry)));
            }
        }
        Value::Null => {}
        other => {
            return Err(format!(
                "expected a map or array of messages, found {}",
                kind(&other)
            ))
        }
    }
    Ok(out)
}

fn collect_map(
    prefix: Option<&str>,
    map: Map<String, Value>,
    out: &mut Vec<(String, RawMessageEntry)>,
) -> Result<(), String> {
    for (key, value) in map {
        let id = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            Value::String(text) => out.push((id, RawMessageEntry::Text(text))),
            Value::Object(inner) if is_message(&inner) => {
                let entry = structured(&inner)?;
                let id = entry.id.clone().unwrap_or(id);
                out.push((id, RawMessageEntry::Structured(entry)));
            }
            Value::Object(inner) => collect_map(Some(&id), inner, out)?,
            other => {
                return Err(format!(
                    "message '{}' must be a string or map, found {}",
                    id,
                    kind(&other)
                ))
            }
        }
    }
    Ok(())
}

fn is_message(map: &Map<String, Value>) -> bool {
    map.iter().any(|(key, value)| {
        value.is_string() && RESERVED_KEYS.contains(&key.to_ascii_lowercase().as_str())
    })
}

fn structured(map: &Map<String, Value>) -> Result<StructuredEntry, String> {
    let mut entry = StructuredEntry::default();
    for (key, value) in map {
        let lower = key.to_ascii_lowercase();
        let Some(text) = value.as_str() else {
            if RESERVED_KEYS.contains(&lower.as_str()) {
                return Err(format!("field '{}' must be a string", key));
            }
            continue;
        };
        let text = text.to_string();
        match lower.as_str() {
            "id" => entry.id = Some(text),
            "description" => entry.description = Some(text),
            "hash" => entry.hash = Some(text),
            "leftdelim" => entry.left_delim = Some(text),
            "rightdelim" => entry.right_delim = Some(text),
            other => {
                if let Some(category) = PluralCategory::from_key(other) {
                    entry.variants.insert(category, text);
                }
            }
        }
    }
    Ok(entry)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::TemplateData;
    use serde_json::json;

    fn ids(entries: &[(String, RawMessageEntry)]) -> Vec<&str> {
        entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    // ==================== Collect Tests ====================

    #[test]
    fn test_collect_plain_strings() {
        let entries = collect_entries(json!({"Hello": "hello", "Bye": "bye"})).unwrap();
        assert_eq!(ids(&entries), vec!["Bye", "Hello"]);
        assert_eq!(entries[1].1, RawMessageEntry::Text("hello".to_string()));
    }

    #[test]
    fn test_collect_plural_map() {
        let entries =
            collect_entries(json!({"Cats": {"one": "a cat", "other": "cats"}})).unwrap();
        let RawMessageEntry::Structured(entry) = &entries[0].1 else {
            panic!("Expected structured entry");
        };
        assert_eq!(entry.variants.len(), 2);
        assert_eq!(entry.variants[&PluralCategory::One], "a cat");
    }

    #[test]
    fn test_collect_reserved_keys_case_insensitive() {
        let entries = collect_entries(json!({
            "Cats": {"Description": "cats", "LeftDelim": "<<", "RightDelim": ">>", "Other": "x"}
        }))
        .unwrap();
        let RawMessageEntry::Structured(entry) = &entries[0].1 else {
            panic!("Expected structured entry");
        };
        assert_eq!(entry.description.as_deref(), Some("cats"));
        assert_eq!(entry.left_delim.as_deref(), Some("<<"));
        assert_eq!(entry.variants[&PluralCategory::Other], "x");
    }

    #[test]
    fn test_collect_nested_namespaces() {
        let entries = collect_entries(json!({
            "errors": {"notFound": "not found", "auth": {"denied": "denied"}}
        }))
        .unwrap();
        assert_eq!(ids(&entries), vec!["errors.auth.denied", "errors.notFound"]);
    }

    #[test]
    fn test_collect_array_form() {
        let entries = collect_entries(json!([
            {"id": "Hello", "other": "hello"},
            {"id": "Bye", "other": "bye"}
        ]))
        .unwrap();
        assert_eq!(ids(&entries), vec!["Hello", "Bye"]);
    }

    #[test]
    fn test_collect_array_item_without_id_fails() {
        let result = collect_entries(json!([{"other": "hello"}]));
        assert!(result.unwrap_err().contains("no id"));
    }

    #[test]
    fn test_collect_rejects_scalar_document() {
        assert!(collect_entries(json!("hello")).is_err());
        assert!(collect_entries(json!({"Count": 3})).is_err());
    }

    #[test]
    fn test_collect_null_document_is_empty() {
        assert!(collect_entries(Value::Null).unwrap().is_empty());
    }

    // ==================== Definition Tests ====================

    #[test]
    fn test_text_definition_is_other() {
        let def = MessageDefinition::from_raw("Hello", RawMessageEntry::Text("hi".to_string()));
        assert_eq!(def.other().map(|t| t.source()), Some("hi"));
        assert_eq!(def.categories().collect::<Vec<_>>(), vec![PluralCategory::Other]);
    }

    #[test]
    fn test_select_falls_back_to_other() {
        let mut entry = StructuredEntry::default();
        entry.variants.insert(PluralCategory::One, "one".to_string());
        entry.variants.insert(PluralCategory::Other, "other".to_string());
        let def = MessageDefinition::from_raw("X", RawMessageEntry::Structured(entry));

        assert_eq!(def.select(PluralCategory::One).unwrap().source(), "one");
        assert_eq!(def.select(PluralCategory::Few).unwrap().source(), "other");
    }

    #[test]
    fn test_select_without_other_uses_first_variant() {
        let mut entry = StructuredEntry::default();
        entry.variants.insert(PluralCategory::One, "only one".to_string());
        let def = MessageDefinition::from_raw("X", RawMessageEntry::Structured(entry));
        assert_eq!(def.select(PluralCategory::Other).unwrap().source(), "only one");
    }

    #[test]
    fn test_custom_delims_apply_to_variants() {
        let entry = StructuredEntry {
            left_delim: Some("<<".to_string()),
            right_delim: Some(">>".to_string()),
            variants: BTreeMap::from([(PluralCategory::Other, "hi <<.Name>>".to_string())]),
            ..Default::default()
        };
        let def = MessageDefinition::from_raw("X", RawMessageEntry::Structured(entry));
        let data = TemplateData::new().with("Name", "Bo");
        assert_eq!(def.other().unwrap().render(&data), "hi Bo");
    }

    #[test]
    fn test_placeholders_across_variants() {
        let entries = collect_entries(json!({
            "Cats": {"one": "{{.Name}} has a cat", "other": "{{.Name}} has {{.Count}} cats"}
        }))
        .unwrap();
        let (id, raw) = entries.into_iter().next().unwrap();
        let def = MessageDefinition::from_raw(id, raw);
        assert_eq!(def.placeholders(), vec!["Count", "Name"]);
    }
}
