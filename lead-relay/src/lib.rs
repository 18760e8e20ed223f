//! Lead Relay - Meta lead ads to Notion.
//!
//! This library backs the `lead-relay` web server, which:
//! - Answers the Meta webhook subscription handshake
//! - Verifies signed lead notifications and acknowledges them immediately
//! - Fetches each lead from the Graph API and writes it to a Notion database
//!
//! ## Architecture
//!
//! ```text
//! Meta → POST /fb-webhook → 200 OK
//!                         ↘ (spawned) Graph API → map_lead() → Notion
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod lead;
pub mod notion;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::{Config, SignaturePolicy};
pub use error::RelayError;
pub use graph::GraphClient;
pub use lead::{LeadNotification, LeadRecord, WebhookPayload};
pub use notion::NotionClient;
pub use relay::{LeadRelay, LeadSource, RecordSink, RelaySummary};
pub use web::{create_router, AppState};
