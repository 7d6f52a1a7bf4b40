//! trackstar-live server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use trackstar_live::api;
use trackstar_live::app_state::AppState;
use trackstar_live::auth::TokenAuthority;
use trackstar_live::config::{LiveConfig, LogFormat};
use trackstar_live::domain::SubscriberRegistry;
use trackstar_live::persistence::{SqliteStore, TrackStore};
use trackstar_live::service::TrackService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = LiveConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, url = %config.public_url, "starting trackstar-live");

    // Build persistence and domain layers
    let store = SqliteStore::connect(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;
    let authority = Arc::new(TokenAuthority::new(&config.public_url, &config.admin_key));
    let subscribers = Arc::new(SubscriberRegistry::new(config.subscriber_buffer));

    // Build service layer
    let track_service = Arc::new(TrackService::new(
        authority,
        Arc::new(store) as Arc<dyn TrackStore>,
        subscribers,
    ));

    // Build router
    let app = api::build_app(AppState {
        track_service: Arc::clone(&track_service),
    });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let draining = Arc::clone(&track_service);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("shutting down server");
            // end live streams so open connections let the server drain
            draining.subscribers().shutdown();
        })
        .await?;

    track_service.shutdown().await;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "installing ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "installing SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
