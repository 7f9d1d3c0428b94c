use anyhow::{Context, Result};
use localizer::config::ServerConfig;
use localizer::i18n::{CatalogValidator, Engine, EngineConfig, LanguageTag, Loader};
use localizer::server;
use rust_embed::RustEmbed;
use std::sync::Arc;
use tracing::{info, warn};

/// Messages compiled into the binary.
#[derive(RustEmbed)]
#[folder = "locales/"]
struct BundledLocales;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("localizer=info".parse()?),
        )
        .init();

    info!("Starting localizer");

    let config = ServerConfig::from_env()?;
    let default_language = LanguageTag::parse(&config.default_language)
        .context("I18N_DEFAULT_LANGUAGE is not a valid language tag")?;

    let mut engine_config = EngineConfig::new(default_language)
        .with_loader(Loader::embedded::<BundledLocales>())
        .with_language_key(config.language_key.clone());
    if let Some(dir) = &config.locales_dir {
        info!("Merging messages from {}", dir.display());
        engine_config = engine_config.with_loader(Loader::dir(dir));
    }

    let engine = Engine::new(engine_config).context("Failed to load message catalog")?;

    let report = CatalogValidator::validate(&engine.catalog());
    for error in &report.errors {
        warn!("Catalog error: {}", error);
    }
    for warning in &report.warnings {
        warn!("Catalog warning: {}", warning);
    }

    let app = server::router(Arc::new(engine));
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
