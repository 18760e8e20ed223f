//! Lead Relay Web Server - Meta lead webhook receiver.
//!
//! This binary:
//! - Answers the subscription handshake on `GET /fb-webhook`
//! - Verifies and acknowledges lead notifications on `POST /fb-webhook`
//! - Relays each lead from the Graph API into Notion in the background

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leadrelay::{create_router, AppState, Config, GraphClient, LeadRelay, NotionClient};

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        app_secret_configured = config.fb_app_secret.is_some(),
        verify_token_configured = config.fb_verify_token.is_some(),
        page_access_token_set = !config.fb_page_access_token.is_empty(),
        graph_api_version = %config.graph_api_version,
        signature_policy = ?config.signature_policy,
        relay_enabled = config.relay_enabled(),
        "config_loaded"
    );

    let relay = build_relay(&config).context("Failed to build lead relay")?;
    if relay.is_none() {
        warn!("relay_disabled_notifications_will_only_be_logged");
    }

    let state = AppState::new(config.clone(), relay);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Wire the Graph and Notion clients when Notion is configured.
fn build_relay(config: &Config) -> Result<Option<LeadRelay>> {
    let (Some(token), Some(database_id)) = (&config.notion_token, &config.notion_database_id)
    else {
        return Ok(None);
    };

    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let graph = GraphClient::from_config(client.clone(), config);
    let notion = NotionClient::new(
        client,
        config.notion_base_url.clone(),
        token.clone(),
        database_id.clone(),
    );

    Ok(Some(LeadRelay::new(Arc::new(graph), Arc::new(notion))))
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
