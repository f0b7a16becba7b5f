//! topicpost - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the post generation API.

use std::sync::Arc;

use topicpost::{
    api::{self, AppState},
    config::{Config, LogFormat},
    generator::PostGenerator,
    llm::{HttpConnector, ModelProvider},
    search::SearchCascade,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("topicpost={level},tower_http={level}", level = config.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!(
        primary_candidates = config.model.primary_candidates.len(),
        fallback_enabled = config.model.fallback_api_key.is_some(),
        max_iterations = config.agent.max_iterations,
        "Loaded configuration"
    );

    // Pick the model once; every request shares it
    let connector = HttpConnector::new(config.model.request_timeout, config.model.temperature)?;
    let state = match ModelProvider::initialize(&config.model, &connector).await {
        Ok(model) => {
            let search = Arc::new(SearchCascade::from_config(&config.search)?);
            info!(
                model = %model.candidate(),
                providers = ?search.provider_names(),
                "Post generator ready"
            );
            AppState::ready(Arc::new(PostGenerator::new(model, search, &config)))
        }
        Err(e) => {
            error!(error = %e, "Model initialization failed, generation will be unavailable");
            AppState::degraded(e.to_string())
        }
    };

    info!("Starting server on {}:{}", config.host, config.port);
    api::serve(&config, state).await?;

    Ok(())
}
