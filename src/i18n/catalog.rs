//! Message catalog: every loaded definition, keyed by language then id.
//!
//! A [`Catalog`] is assembled by a [`CatalogBuilder`] and is read-only from
//! then on. Sources are merged in the order they are added; within one
//! language the last definition for an id wins.

use crate::i18n::format::FormatRegistry;
use crate::i18n::source::{walk, Loader};
use crate::i18n::{I18nError, LanguageTag, MessageDefinition};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

type Messages = BTreeMap<String, Arc<MessageDefinition>>;

/// Read-only set of message definitions for all loaded languages.
#[derive(Debug, Clone)]
pub struct Catalog {
    default_language: LanguageTag,
    messages: HashMap<LanguageTag, Messages>,
}

impl Catalog {
    /// The language every other language falls back to.
    pub fn default_language(&self) -> &LanguageTag {
        &self.default_language
    }

    /// Definition of `id` in exactly `language`; no fallback.
    pub fn get_definition(&self, language: &LanguageTag, id: &str) -> Option<&Arc<MessageDefinition>> {
        self.messages.get(language)?.get(id)
    }

    pub fn contains_language(&self, language: &LanguageTag) -> bool {
        self.messages.contains_key(language)
    }

    /// Loaded languages, sorted by tag.
    pub fn languages(&self) -> Vec<LanguageTag> {
        let mut languages: Vec<LanguageTag> = self.messages.keys().cloned().collect();
        languages.sort_by_key(|tag| tag.to_string());
        languages
    }

    /// Message ids loaded for `language`, sorted.
    pub fn message_ids(&self, language: &LanguageTag) -> Vec<&str> {
        self.messages
            .get(language)
            .map(|messages| messages.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub(crate) fn messages(&self, language: &LanguageTag) -> Option<&Messages> {
        self.messages.get(language)
    }

    /// Total number of definitions across languages.
    pub fn len(&self) -> usize {
        self.messages.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates sources into a [`Catalog`].
#[derive(Debug)]
pub struct CatalogBuilder {
    default_language: LanguageTag,
    registry: FormatRegistry,
    messages: HashMap<LanguageTag, Messages>,
}

impl CatalogBuilder {
    pub fn new(default_language: LanguageTag, registry: FormatRegistry) -> Self {
        Self {
            default_language,
            registry,
            messages: HashMap::new(),
        }
    }

    /// Walk `loader` and merge every file it yields.
    ///
    /// The loader's own decoders are registered first and take precedence
    /// over the automatic yaml/toml registration.
    pub fn add_source(&mut self, loader: &Loader) -> Result<&mut Self, I18nError> {
        for (format, decoder) in loader.formats() {
            self.registry.register(format.as_str(), decoder.clone());
        }

        let mut added = 0usize;
        let files = walk(loader, |file| {
            if !self.registry.ensure_well_known(&file.format) {
                return Err(I18nError::UnsupportedFormat {
                    format: file.format.clone(),
                    path: file.path.clone(),
                });
            }

            let entries = self.registry.parse(&file.format, &file.path, &file.bytes)?;
            debug!(
                "Loaded {} messages for '{}' from {}",
                entries.len(),
                file.language,
                file.path
            );

            let messages = self.messages.entry(file.language.clone()).or_default();
            for (id, raw) in entries {
                let definition = MessageDefinition::from_raw(id.clone(), raw);
                messages.insert(id, Arc::new(definition));
                added += 1;
            }
            Ok(())
        })?;

        info!(
            "Loaded {} files ({} messages) from {}",
            files,
            added,
            loader.describe()
        );
        Ok(self)
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Finish the catalog. Fails when nothing was loaded for the default
    /// language.
    pub fn build(self) -> Result<Catalog, I18nError> {
        if !self.messages.contains_key(&self.default_language) {
            return Err(I18nError::DefaultLanguageMissing(self.default_language));
        }
        Ok(Catalog {
            default_language: self.default_language,
            messages: self.messages,
        })
    }
}
