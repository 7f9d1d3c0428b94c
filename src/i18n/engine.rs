//! The translation engine.
//!
//! An [`Engine`] owns the configuration it was built from and the currently
//! published catalog. Shared as `Arc<Engine>` it is safe to use from any
//! number of threads:
//!
//! ```no_run
//! use localizer::i18n::{Engine, EngineConfig, LanguageTag, Loader, TranslationRequest};
//!
//! let config = EngineConfig::new(LanguageTag::parse("en")?)
//!     .with_loader(Loader::dir("locales"));
//! let engine = Engine::new(config)?;
//!
//! let zh = LanguageTag::parse("zh")?;
//! let text = engine.must_translate(&zh, TranslationRequest::new("PersonCats")
//!     .with_value("Name", "Nick")
//!     .with_count(2));
//! println!("{}", text);
//! # Ok::<(), localizer::i18n::I18nError>(())
//! ```
//!
//! [`Engine::reload`] rereads every source and swaps the catalog in one step;
//! localizers built for the old catalog are dropped with it.

use crate::i18n::catalog::{Catalog, CatalogBuilder};
use crate::i18n::format::{FormatRegistry, UnmarshalFn};
use crate::i18n::localizer::{Localizer, MessageRequest};
use crate::i18n::metrics::EngineMetrics;
use crate::i18n::negotiate::{
    LanguageProvider, LanguageSignals, Negotiator, DEFAULT_HEADER_NAME, DEFAULT_LANGUAGE_KEY,
};
use crate::i18n::source::Loader;
use crate::i18n::{I18nError, LanguageTag, Untranslated};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Everything an [`Engine`] is built from.
pub struct EngineConfig {
    default_language: LanguageTag,
    loaders: Vec<Loader>,
    formats: Vec<(String, UnmarshalFn)>,
    providers: Vec<LanguageProvider>,
    language_key: String,
    header_name: String,
}

impl EngineConfig {
    pub fn new(default_language: LanguageTag) -> Self {
        Self {
            default_language,
            loaders: Vec::new(),
            formats: Vec::new(),
            providers: LanguageProvider::DEFAULT_ORDER.to_vec(),
            language_key: DEFAULT_LANGUAGE_KEY.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
        }
    }

    /// Add a message source. Later loaders override earlier ones.
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Register a decoder for every loader.
    pub fn with_format(mut self, format: impl Into<String>, decoder: UnmarshalFn) -> Self {
        self.formats.push((format.into(), decoder));
        self
    }

    /// Replace the provider order used by [`Engine::resolve_language`].
    pub fn with_providers(mut self, providers: Vec<LanguageProvider>) -> Self {
        self.providers = providers;
        self
    }

    /// Cookie, query and form field name carrying the language.
    pub fn with_language_key(mut self, key: impl Into<String>) -> Self {
        self.language_key = key.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn default_language(&self) -> &LanguageTag {
        &self.default_language
    }

    pub fn loaders(&self) -> &[Loader] {
        &self.loaders
    }

    fn validate(&self) -> Result<(), I18nError> {
        if self.loaders.is_empty() {
            return Err(I18nError::InvalidConfig("no message sources configured".to_string()));
        }
        if self.language_key.trim().is_empty() {
            return Err(I18nError::InvalidConfig("language key is empty".to_string()));
        }
        if self.header_name.trim().is_empty() {
            return Err(I18nError::InvalidConfig("header name is empty".to_string()));
        }
        Ok(())
    }

    fn load(&self) -> Result<Catalog, I18nError> {
        let mut registry = FormatRegistry::with_builtins();
        for (format, decoder) in &self.formats {
            registry.register(format.as_str(), decoder.clone());
        }

        let mut builder = CatalogBuilder::new(self.default_language.clone(), registry);
        for loader in &self.loaders {
            builder.add_source(loader)?;
        }
        builder.build()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formats: Vec<&str> = self.formats.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("EngineConfig")
            .field("default_language", &self.default_language)
            .field("loaders", &self.loaders)
            .field("formats", &formats)
            .field("providers", &self.providers)
            .field("language_key", &self.language_key)
            .field("header_name", &self.header_name)
            .finish()
    }
}

/// A published catalog together with the localizers derived from it.
#[derive(Debug)]
struct Snapshot {
    catalog: Arc<Catalog>,
    known: HashSet<LanguageTag>,
    localizers: RwLock<HashMap<LanguageTag, Arc<Localizer>>>,
}

impl Snapshot {
    fn new(catalog: Catalog) -> Self {
        Self {
            known: catalog.languages().into_iter().collect(),
            catalog: Arc::new(catalog),
            localizers: RwLock::new(HashMap::new()),
        }
    }

    /// Loaded language to serve `requested` with: the tag itself, its primary
    /// language, or the default.
    fn effective_language(&self, requested: &LanguageTag) -> LanguageTag {
        if self.known.contains(requested) {
            return requested.clone();
        }
        let primary = requested.primary();
        if self.known.contains(&primary) {
            return primary;
        }
        self.catalog.default_language().clone()
    }
}

pub struct Engine {
    config: EngineConfig,
    negotiator: Negotiator,
    snapshot: RwLock<Arc<Snapshot>>,
    metrics: EngineMetrics,
}

impl Engine {
    /// Validate `config`, load every source and publish the first catalog.
    pub fn new(config: EngineConfig) -> Result<Engine, I18nError> {
        config.validate()?;
        let catalog = config.load()?;
        info!(
            "Catalog ready: {} languages, {} messages, default '{}'",
            catalog.languages().len(),
            catalog.len(),
            catalog.default_language()
        );

        let negotiator = Negotiator::new(
            config.providers.clone(),
            config.language_key.clone(),
            config.header_name.clone(),
        );
        Ok(Engine {
            config,
            negotiator,
            snapshot: RwLock::new(Arc::new(Snapshot::new(catalog))),
            metrics: EngineMetrics::new(),
        })
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn default_language(&self) -> &LanguageTag {
        self.config.default_language()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// The catalog currently being served.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.snapshot().catalog.clone()
    }

    pub fn languages(&self) -> Vec<LanguageTag> {
        self.snapshot().catalog.languages()
    }

    /// Cached localizer for `language`. Languages that are not loaded get the
    /// localizer of their primary language if that is loaded, otherwise the
    /// default language's.
    pub fn localizer(&self, language: &LanguageTag) -> Arc<Localizer> {
        let snapshot = self.snapshot();
        let effective = snapshot.effective_language(language);

        if let Some(localizer) = snapshot
            .localizers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&effective)
        {
            return localizer.clone();
        }

        let built = Arc::new(Localizer::build(&snapshot.catalog, &effective));
        self.metrics.record_localizer_build();
        debug!("Built localizer for '{}' ({} messages)", effective, built.len());

        let stored = snapshot
            .localizers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(effective)
            .or_insert(built)
            .clone();
        stored
    }

    /// Translate `request` into `language`.
    ///
    /// On failure the [`Untranslated`] still carries text to display.
    pub fn translate(
        &self,
        language: &LanguageTag,
        request: impl Into<MessageRequest>,
    ) -> Result<String, Untranslated> {
        let request = request.into();
        self.metrics.record_translation();

        let localizer = self.localizer(language);
        let result = localizer.localize(&request);
        match &result {
            Err(untranslated) => {
                if matches!(untranslated.error, I18nError::MessageNotFound { .. }) {
                    self.metrics.record_not_found();
                }
                debug!("Untranslated '{}': {}", request.message_id(), untranslated.error);
            }
            Ok(_) => {
                if localizer.language() != language || localizer.is_fallback(request.message_id()) {
                    self.metrics.record_fallback();
                }
            }
        }
        result
    }

    /// Translate a JSON request: a bare id string or a request object.
    ///
    /// Any other shape yields empty text with `UnsupportedRequestShape`.
    pub fn translate_value(&self, language: &LanguageTag, value: Value) -> Result<String, Untranslated> {
        let request = MessageRequest::try_from(value).map_err(|e| Untranslated::new("", e))?;
        self.translate(language, request)
    }

    /// Like [`translate`](Self::translate) but always returns displayable text.
    pub fn must_translate(&self, language: &LanguageTag, request: impl Into<MessageRequest>) -> String {
        self.translate(language, request)
            .unwrap_or_else(Untranslated::into_text)
    }

    /// Negotiate the language for one request. Unresolved requests get the
    /// default language.
    pub fn resolve_language(&self, signals: &impl LanguageSignals) -> LanguageTag {
        let snapshot = self.snapshot();
        self.negotiator
            .resolve(signals, &snapshot.known)
            .unwrap_or_else(|| self.default_language().clone())
    }

    /// Reread every source and publish the result.
    ///
    /// On error the current catalog stays in place.
    pub fn reload(&self) -> Result<(), I18nError> {
        let catalog = self.config.load()?;
        let messages = catalog.len();
        let snapshot = Arc::new(Snapshot::new(catalog));
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.metrics.record_reload();
        info!("Catalog reloaded: {} messages", messages);
        Ok(())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("default_language", self.default_language())
            .field("languages", &self.languages())
            .finish()
    }
}
