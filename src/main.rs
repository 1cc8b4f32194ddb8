//! sentiment-api service entry point.

use anyhow::Result;
use clap::Parser;
use sentiment_api::config::Config;
use sentiment_api::logging::init_logging;
use sentiment_api::service::{app, SentimentService};
use sentiment_api::ModelLoader;

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.log_format);

    tracing::info!("Sentiment Analysis API v{}", env!("CARGO_PKG_VERSION"));

    let capability = ModelLoader::new(config.model_source(), config.device_request())
        .load()
        .await;
    let service = SentimentService::new(capability);
    if !service.is_available() {
        tracing::warn!("Serving fallback responses only; the model is not loaded");
    }

    let app = app(service, config.allowed_origins.as_slice())?;

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Starting HTTP server on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
