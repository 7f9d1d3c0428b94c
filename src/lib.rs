//! Message localization: locale-tagged message files, language negotiation,
//! CLDR plurals and an axum adapter.

pub mod config;
pub mod i18n;
pub mod server;

pub use i18n::{Engine, EngineConfig, I18nError, LanguageTag, Loader, TranslationRequest};
