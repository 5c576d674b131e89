//! guestbook-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use guestbook_gateway::api;
use guestbook_gateway::app_state::AppState;
use guestbook_gateway::config::{GuestbookConfig, LogFormat};
use guestbook_gateway::messaging::{
    EntryEventPublisher, EntryEventSubscriber, LoggingHandler, connect_broker,
};
use guestbook_gateway::persistence::connect_store;
use guestbook_gateway::service::GuestbookService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GuestbookConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        store = %config.store_backend,
        broker = ?config.messaging.backend,
        "starting guestbook-gateway"
    );

    // Infrastructure
    let store = connect_store(&config)
        .await
        .context("failed to open entry store")?;
    let broker = connect_broker(&config.messaging)
        .await
        .context("failed to connect message broker")?;

    // Background subscriber that logs every notification
    let audit = EntryEventSubscriber::bind(
        &*broker,
        &config.messaging.exchange,
        &config.messaging.queue_prefix,
        Arc::new(LoggingHandler),
    )
    .await
    .context("failed to bind logging subscriber")?;

    // Service layer
    let publisher = EntryEventPublisher::new(
        Arc::clone(&broker),
        &config.messaging.exchange,
        &config.messaging.routing_key,
    );
    let guestbook_service = Arc::new(GuestbookService::new(
        store,
        publisher,
        config.store_timeout,
        config.publish_timeout,
    ));

    let app_state = AppState {
        guestbook_service,
        broker,
        messaging: Arc::new(config.messaging.clone()),
    };
    let app = api::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    audit.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
