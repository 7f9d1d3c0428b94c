//! Error taxonomy for catalog loading and translation.
//!
//! Errors fall into two groups:
//!
//! - **Initialization** errors (bad file names, unknown formats, unreadable
//!   sources, malformed files, missing default language). Engine
//!   construction fails and nothing is served.
//! - **Per-call** errors (unknown message, bad plural count, unsupported
//!   request shape). Translation still yields displayable text alongside the
//!   error, see [`Untranslated`].

use crate::i18n::LanguageTag;
use thiserror::Error;

/// Boxed error produced by format decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("invalid locale in file name '{path}': {reason}")]
    InvalidLocaleFilename { path: String, reason: String },

    #[error("unsupported message format '{format}' for '{path}'")]
    UnsupportedFormat { format: String, path: String },

    #[error("failed to read message source '{path}'")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}' as {format}: {reason}")]
    MalformedMessageFile {
        path: String,
        format: String,
        reason: String,
    },

    #[error("no messages loaded for default language '{0}'")]
    DefaultLanguageMissing(LanguageTag),

    #[error("invalid language tag '{tag}': {reason}")]
    InvalidLanguageTag { tag: String, reason: String },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("message '{id}' not found for language '{language}'")]
    MessageNotFound { id: String, language: LanguageTag },

    #[error("invalid plural count '{0}'")]
    InvalidPluralCount(String),

    #[error("unsupported translation request: {0}")]
    UnsupportedRequestShape(String),
}

impl I18nError {
    /// Whether this error must abort engine construction.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            I18nError::MessageNotFound { .. }
                | I18nError::InvalidPluralCount(_)
                | I18nError::UnsupportedRequestShape(_)
        )
    }
}

/// A translation that could not be rendered.
///
/// `text` is what the caller should display anyway: the message id for
/// lookup failures, or an empty string when the request itself was unusable.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Untranslated {
    pub text: String,
    #[source]
    pub error: I18nError,
}

impl Untranslated {
    pub fn new(text: impl Into<String>, error: I18nError) -> Self {
        Self {
            text: text.into(),
            error,
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
