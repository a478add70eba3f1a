//! Scribe Server - Main entry point
//!
//! Entity record service with persist-then-publish change events.

use std::net::SocketAddr;
use std::sync::Arc;

use scribe_core::{
    api::{self, AppState},
    config::Config,
    observability,
    publisher::{EventPublisher, RedisStreamPublisher, RedisStreamPublisherConfig},
    store::{RecordStore, RedisStore, RedisStoreConfig},
    writer::{EntityWriter, WriterConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; SCRIBE_CONFIG points at a config file, with
    // SCRIBE__* environment variables layered on top either way
    let config = match std::env::var("SCRIBE_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load config: {}. Using defaults.", e);
            Config::default()
        }),
    };

    // Initialize observability
    observability::init_tracing(&config.observability);
    let metrics_handle = observability::init_metrics()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Scribe Server"
    );

    // Connect the record store; the commit path depends on it, so startup
    // fails if it is unreachable
    let store: Arc<dyn RecordStore> = Arc::new(
        RedisStore::new(RedisStoreConfig {
            url: config.store.url.clone(),
            key_prefix: config.store.key_prefix.clone(),
        })
        .await?,
    );
    tracing::info!("Record store connected");

    // Connect the event publisher
    let publisher: Arc<dyn EventPublisher> = Arc::new(
        RedisStreamPublisher::new(RedisStreamPublisherConfig {
            url: config.publisher_url().to_string(),
            stream_prefix: config.publisher.stream_prefix.clone(),
        })
        .await?,
    );
    tracing::info!("Event publisher connected");

    // Create the write orchestrator
    let writer = EntityWriter::new(
        store.clone(),
        publisher.clone(),
        WriterConfig {
            commit_timeout: config.store.commit_timeout,
            notify_timeout: config.publisher.notify_timeout,
        },
    );

    // Create app state and build the router
    let app_state = AppState::new(writer, store, publisher, Some(metrics_handle));
    let app = api::build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
