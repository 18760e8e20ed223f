//! Webhook payload and lead record types.
//!
//! This module defines:
//! - The inbound Meta webhook body (`WebhookPayload` and its nested entries)
//! - `LeadNotification`: the identifiers carried by one `leadgen` change
//! - `LeadRecord`: the normalized row written to Notion

use serde::{Deserialize, Serialize};

/// Top-level `object` value for page subscriptions.
pub const PAGE_OBJECT: &str = "page";

/// Change `field` value for lead-generation events.
pub const LEADGEN_FIELD: &str = "leadgen";

// =============================================================================
// Inbound Webhook Types
// =============================================================================

/// Meta webhook delivery body.
///
/// Every level is optional so that a partial body still parses and simply
/// yields no notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<LeadgenValue>,
}

/// The `value` object of a `leadgen` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadgenValue {
    #[serde(default, deserialize_with = "id_string")]
    pub leadgen_id: Option<String>,
    #[serde(default, deserialize_with = "id_string")]
    pub page_id: Option<String>,
    #[serde(default, deserialize_with = "id_string")]
    pub form_id: Option<String>,
    #[serde(default)]
    pub created_time: Option<i64>,
}

/// Accept ids delivered either as JSON strings or as bare numbers.
fn id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Lead Types
// =============================================================================

/// Identifiers of one submitted lead, taken from a `leadgen` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadNotification {
    pub leadgen_id: String,
    pub page_id: String,
}

/// Normalized lead ready to be written to Notion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub serial: u64,
    pub full_name: String,
    pub hospital_name: String,
    pub phone_number: String,
    pub location: String,
}

impl LeadRecord {
    pub const DEFAULT_SERIAL: u64 = 1;
    pub const DEFAULT_FULL_NAME: &'static str = "Unknown";
    pub const DEFAULT_HOSPITAL_NAME: &'static str = "N/A";
    pub const DEFAULT_PHONE_NUMBER: &'static str = "-";
    pub const DEFAULT_LOCATION: &'static str = "N/A";
}

impl Default for LeadRecord {
    fn default() -> Self {
        Self {
            serial: Self::DEFAULT_SERIAL,
            full_name: Self::DEFAULT_FULL_NAME.to_string(),
            hospital_name: Self::DEFAULT_HOSPITAL_NAME.to_string(),
            phone_number: Self::DEFAULT_PHONE_NUMBER.to_string(),
            location: Self::DEFAULT_LOCATION.to_string(),
        }
    }
}
