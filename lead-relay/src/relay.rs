//! Notification processing - enrichment and publishing of leads.
//!
//! The web handler acknowledges a delivery first and then hands the raw body
//! to [`LeadRelay::process_payload`] on a spawned task.
//!
//! ## Processing Flow
//!
//! ```text
//! body → WebhookPayload → LeadNotification → LeadSource → map_lead() → RecordSink
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::lead::{map_lead, LeadNotification, LeadRecord, WebhookPayload, LEADGEN_FIELD, PAGE_OBJECT};

/// Source of full lead details for a leadgen id.
///
/// Implementations log their own failures and return `None`; the pipeline
/// then publishes a record made of defaults.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn fetch_lead(&self, leadgen_id: &str) -> Option<Value>;
}

/// Destination for normalized lead records.
///
/// Failures are logged by the implementation and never surfaced.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn publish(&self, record: &LeadRecord);
}

/// Counts reported after one delivery has been processed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// Number of `leadgen` changes found in the delivery
    pub notifications: usize,
    /// Number of records handed to the sink; write failures are only logged
    /// by the sink and still count here
    pub relayed: usize,
}

/// Enrich-then-publish pipeline.
#[derive(Clone)]
pub struct LeadRelay {
    source: Arc<dyn LeadSource>,
    sink: Arc<dyn RecordSink>,
}

impl LeadRelay {
    pub fn new(source: Arc<dyn LeadSource>, sink: Arc<dyn RecordSink>) -> Self {
        Self { source, sink }
    }

    /// Extract the lead notifications of interest from a parsed delivery.
    ///
    /// Only `object == "page"` deliveries and `field == "leadgen"` changes
    /// qualify.
    pub fn notifications(payload: &WebhookPayload) -> Vec<LeadNotification> {
        if payload.object.as_deref() != Some(PAGE_OBJECT) {
            return Vec::new();
        }

        payload
            .entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .filter(|change| change.field.as_deref() == Some(LEADGEN_FIELD))
            .map(|change| {
                let value = change.value.clone().unwrap_or_default();
                LeadNotification {
                    leadgen_id: value.leadgen_id.unwrap_or_default(),
                    page_id: value.page_id.unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Process a raw delivery body.
    ///
    /// Changes are handled one after another. A body that is not valid JSON
    /// is logged and dropped.
    pub async fn process_payload(&self, body: &[u8]) -> RelaySummary {
        let payload = match parse_payload(body) {
            Some(p) => p,
            None => return RelaySummary::default(),
        };

        let notifications = Self::notifications(&payload);
        let mut summary = RelaySummary {
            notifications: notifications.len(),
            relayed: 0,
        };

        for notification in &notifications {
            self.relay_one(notification).await;
            summary.relayed += 1;
        }

        info!(
            object = ?payload.object,
            notifications = summary.notifications,
            relayed = summary.relayed,
            "webhook_process_complete"
        );

        summary
    }

    async fn relay_one(&self, notification: &LeadNotification) {
        info!(
            leadgen_id = %notification.leadgen_id,
            page_id = %notification.page_id,
            "lead_notification_received"
        );

        let lead = self.source.fetch_lead(&notification.leadgen_id).await;
        info!(
            leadgen_id = %notification.leadgen_id,
            enriched = lead.is_some(),
            "lead_details_fetched"
        );

        let record = map_lead(lead.as_ref());
        self.sink.publish(&record).await;
    }
}

/// Parse a delivery body, logging instead of failing.
pub fn parse_payload(body: &[u8]) -> Option<WebhookPayload> {
    match serde_json::from_slice::<WebhookPayload>(body) {
        Ok(p) => Some(p),
        Err(e) => {
            error!(
                error = %e,
                body_length = body.len(),
                "webhook_payload_parse_failed"
            );
            None
        }
    }
}

/// Log every lead notification in a delivery without enriching it.
///
/// Used when no relay is configured.
pub fn log_notifications(body: &[u8]) -> usize {
    let Some(payload) = parse_payload(body) else {
        return 0;
    };

    let notifications = LeadRelay::notifications(&payload);
    for n in &notifications {
        info!(
            leadgen_id = %n.leadgen_id,
            page_id = %n.page_id,
            relay_enabled = false,
            "lead_notification_received"
        );
    }
    notifications.len()
}
