// Forbid unwrap() in production code to prevent panics from bad input.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::sync::Arc;

use step_webhooks::{Authenticator, Directory, SecretRegistry, config::ServerConfig, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "step_webhooks=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: secrets_file={}, listen_address={}",
        config.secrets_file.display(),
        config.listen_address
    );

    let registry = match SecretRegistry::from_json_file(&config.secrets_file) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to load webhook secrets: {e}");
            std::process::exit(1);
        }
    };
    if registry.is_empty() {
        tracing::warn!("No webhook secrets configured; every call will be rejected");
    }
    tracing::info!("Loaded {} webhook secret(s)", registry.len());

    let directory = match &config.directory_file {
        Some(path) => match Directory::from_json_file(path) {
            Ok(directory) => directory,
            Err(e) => {
                tracing::error!("Failed to load identity directory: {e}");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No identity directory configured; every lookup will miss");
            Directory::default()
        }
    };
    tracing::info!("Loaded {} directory entries", directory.len());

    let authenticator = Authenticator::new(Arc::new(registry))
        .with_max_body_bytes(config.max_body_bytes)
        .with_max_request_age(config.max_request_age);
    let app = router(authenticator, Arc::new(directory));

    tracing::info!("listening on {}", config.listen_address);

    let listener = tokio::net::TcpListener::bind(config.listen_address)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
