//! Webhook endpoint handlers.
//!
//! The notification handler only:
//! 1. Verifies the signature
//! 2. Spawns the enrich/publish work
//! 3. Returns 200 immediately
//!
//! Meta expects a fast response, so nothing after the acknowledgment can
//! change the status code.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::relay::{log_notifications, LeadRelay};
use crate::web::signature::{verify_meta_signature, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Enrich/publish collaborator; `None` means notifications are only logged.
    pub relay: Option<LeadRelay>,
}

impl AppState {
    pub fn new(config: Config, relay: Option<LeadRelay>) -> Self {
        Self {
            config: Arc::new(config),
            relay,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// Query parameters of the subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeParams {
    #[serde(default, rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(default, rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Subscription handshake endpoint.
///
/// Echoes `hub.challenge` when `hub.mode` is `subscribe` and
/// `hub.verify_token` matches the configured token; 403 otherwise, including
/// for a query string that does not parse.
pub async fn verify_subscription(
    State(state): State<AppState>,
    params: Result<Query<HandshakeParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "webhook_subscription_query_invalid");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    let expected = state.config.fb_verify_token.as_deref();

    match (params.mode.as_deref(), params.verify_token.as_deref(), expected) {
        (Some("subscribe"), Some(provided), Some(expected)) if provided == expected => {
            info!("webhook_subscription_verified");
            (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
        }
        (_, _, None) => {
            warn!("webhook_verify_token_not_configured");
            StatusCode::FORBIDDEN.into_response()
        }
        _ => {
            warn!(mode = ?params.mode, "webhook_subscription_rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

// =============================================================================
// Lead Notifications
// =============================================================================

/// Lead notification endpoint.
///
/// The raw body is taken as bytes so the signature is computed over exactly
/// what was sent.
pub async fn receive_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // A header that is not valid UTF-8 counts as present but malformed
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "lead_webhook_received"
    );

    if !verify_meta_signature(
        state.config.fb_app_secret.as_deref(),
        &body,
        signature,
        state.config.signature_policy,
    ) {
        warn!("meta_signature_invalid");
        return StatusCode::UNAUTHORIZED;
    }

    match state.relay.clone() {
        Some(relay) => {
            tokio::spawn(async move {
                relay.process_payload(&body).await;
            });
        }
        None => {
            tokio::spawn(async move {
                log_notifications(&body);
            });
        }
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::lead::LeadRecord;
    use crate::relay::testing::{ChannelSink, FakeSource};
    use crate::web::create_router;
    use crate::web::signature::sign_body;

    const SECRET: &str = "app-secret";
    const LEADGEN_BODY: &str = r#"{"object":"page","entry":[{"changes":[{"field":"leadgen","value":{"leadgen_id":"123","page_id":"456"}}]}]}"#;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    fn state_with(
        config: Config,
        source: Arc<FakeSource>,
    ) -> (AppState, tokio::sync::mpsc::UnboundedReceiver<LeadRecord>) {
        let (sink, rx) = ChannelSink::new();
        let relay = LeadRelay::new(source, Arc::new(sink));
        (AppState::new(config, Some(relay)), rx)
    }

    fn handshake(query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/fb-webhook?{}", query))
            .body(Body::empty())
            .unwrap()
    }

    fn notification(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/fb-webhook")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("X-Hub-Signature-256", sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(AppState::new(config(&[]), None));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_handshake_echoes_challenge() {
        let app = create_router(AppState::new(config(&[("FB_VERIFY_TOKEN", "verify-me")]), None));

        let response = app
            .oneshot(handshake(
                "hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1158201444");
    }

    #[tokio::test]
    async fn test_handshake_rejections() {
        let cases = [
            "hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1",
            "hub.mode=unsubscribe&hub.verify_token=verify-me&hub.challenge=1",
            "hub.verify_token=verify-me&hub.challenge=1",
            "hub.mode=subscribe&hub.challenge=1",
            "hub.mode=subscribe&hub.mode=x&hub.verify_token=verify-me&hub.challenge=1",
        ];

        for query in cases {
            let app =
                create_router(AppState::new(config(&[("FB_VERIFY_TOKEN", "verify-me")]), None));
            let response = app.oneshot(handshake(query)).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "query: {}", query);
        }
    }

    #[tokio::test]
    async fn test_handshake_without_configured_token() {
        let app = create_router(AppState::new(config(&[]), None));

        let response = app
            .oneshot(handshake("hub.mode=subscribe&hub.verify_token=&hub.challenge=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_notification_invalid_signature_unauthorized() {
        let source = Arc::new(FakeSource::new(None));
        let (state, mut rx) = state_with(config(&[("FB_APP_SECRET", SECRET)]), source.clone());
        let app = create_router(state);

        let signature = sign_body("wrong-secret", LEADGEN_BODY.as_bytes());
        let response = app
            .oneshot(notification(LEADGEN_BODY, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(source.calls.lock().await.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notification_valid_signature_relays_lead() {
        let source = Arc::new(FakeSource::new(Some(json!({"id": "123"}))));
        let (state, mut rx) = state_with(config(&[("FB_APP_SECRET", SECRET)]), source.clone());
        let app = create_router(state);

        let signature = sign_body(SECRET, LEADGEN_BODY.as_bytes());
        let response = app
            .oneshot(notification(LEADGEN_BODY, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());

        let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.serial, 123);
        assert_eq!(record.full_name, "Unknown");
        assert_eq!(*source.calls.lock().await, vec!["123".to_string()]);
    }

    #[tokio::test]
    async fn test_notification_without_signature_fails_open() {
        let source = Arc::new(FakeSource::new(None));
        let (state, mut rx) = state_with(config(&[("FB_APP_SECRET", SECRET)]), source);
        let app = create_router(state);

        let response = app.oneshot(notification(LEADGEN_BODY, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record, LeadRecord::default());
    }

    #[tokio::test]
    async fn test_notification_without_signature_strict_policy() {
        let source = Arc::new(FakeSource::new(None));
        let (state, _rx) = state_with(
            config(&[("FB_APP_SECRET", SECRET), ("SIGNATURE_POLICY", "strict")]),
            source,
        );
        let app = create_router(state);

        let response = app.oneshot(notification(LEADGEN_BODY, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_notification_acknowledged_before_enrichment_completes() {
        let source = Arc::new(FakeSource::delayed(None, Duration::from_secs(30)));
        let (state, mut rx) = state_with(config(&[]), source.clone());
        let app = create_router(state);

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            app.oneshot(notification(LEADGEN_BODY, None)),
        )
        .await
        .expect("response waited on enrichment")
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        // Enrichment has started but nothing has been published yet
        for _ in 0..100 {
            if !source.calls.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*source.calls.lock().await, vec!["123".to_string()]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notification_without_relay_only_acknowledges() {
        let app = create_router(AppState::new(config(&[]), None));

        let response = app.oneshot(notification(LEADGEN_BODY, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
