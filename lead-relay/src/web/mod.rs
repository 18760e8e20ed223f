//! Web server module for the Meta lead webhook.
//!
//! This module provides:
//! - `GET /fb-webhook`: subscription handshake
//! - `POST /fb-webhook`: signed lead notifications, acknowledged immediately
//! - `GET /health`: liveness probe

pub mod handlers;
pub mod signature;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, receive_notification, verify_subscription, AppState, HandshakeParams, HealthResponse,
};
pub use signature::{verify_meta_signature, SIGNATURE_HEADER};

/// Path Meta is configured to deliver to.
pub const WEBHOOK_PATH: &str = "/fb-webhook";

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            WEBHOOK_PATH,
            get(verify_subscription).post(receive_notification),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
