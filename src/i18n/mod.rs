//! Internationalization (i18n) engine.
//!
//! Message files are loaded from one or more sources into a catalog, keyed by
//! language and message id. Translation looks a message up in the requested
//! language, falls back to the default language, picks a plural variant with
//! the CLDR rules and substitutes template values.
//!
//! # Architecture
//!
//! - `language`: BCP-47 language tags
//! - `source`: Directory, embedded and in-memory file trees, plus the walker
//! - `format`: File extension to decoder registry (json, yaml, toml, custom)
//! - `message`: Message definitions and the generic message-file layout
//! - `catalog`: All definitions by language and id
//! - `plural`: CLDR plural category selection
//! - `template`: `{{.Name}}` placeholder rendering
//! - `negotiate`: Accept-Language ranking and provider-based language resolution
//! - `localizer`: Per-language view with default-language fallback
//! - `engine`: Configuration, the published catalog and the localizer cache
//! - `validator`: Catalog consistency checks
//! - `metrics`: Translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use localizer::i18n::{Engine, EngineConfig, LanguageTag, Loader};
//!
//! let engine = Engine::new(
//!     EngineConfig::new(LanguageTag::parse("en")?).with_loader(Loader::dir("locales")),
//! )?;
//!
//! let language = engine.resolve_language(&signals);
//! let text = engine.must_translate(&language, "Hello");
//! ```

mod catalog;
mod engine;
mod error;
mod format;
mod language;
mod localizer;
mod message;
mod metrics;
mod negotiate;
mod plural;
mod source;
mod template;
mod validator;

pub use catalog::{Catalog, CatalogBuilder};
pub use engine::{Engine, EngineConfig};
pub use error::{BoxError, I18nError, Untranslated};
pub use format::{
    json_unmarshal, toml_unmarshal, unmarshal_fn, yaml_unmarshal, FormatRegistry, UnmarshalFn,
};
pub use language::LanguageTag;
pub use localizer::{Localizer, MessageRequest, TranslationRequest, PLURAL_COUNT_KEY};
pub use message::{MessageDefinition, RawMessageEntry, StructuredEntry};
pub use metrics::{EngineMetrics, MetricsReport};
pub use negotiate::{
    match_known, parse_accept_language, LanguageProvider, LanguageSignals, Negotiator,
    SignalMap, WeightedTag, DEFAULT_HEADER_NAME, DEFAULT_LANGUAGE_KEY,
};
pub use plural::{PluralCategory, PluralCount, PluralSelector};
pub use source::{
    locale_of, DirSource, EmbeddedSource, Loader, MemorySource, PathFilter, Source, SourceFile,
};
pub use template::{Template, TemplateData, NO_VALUE};
pub use validator::{CatalogValidator, ValidationReport};
