use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Localization
    pub default_language: String,
    pub locales_dir: Option<PathBuf>,
    pub language_key: String,

    // Server
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Localization
            default_language: std::env::var("I18N_DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            locales_dir: std::env::var("I18N_LOCALES_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            language_key: std::env::var("I18N_LANGUAGE_KEY")
                .unwrap_or_else(|_| "lang".to_string()),

            // Server
            port: match std::env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .with_context(|| format!("PORT must be a port number, got '{}'", port))?,
                Err(_) => 8080,
            },
        })
    }
}
