//! Lead data model and field mapping.
//!
//! ```text
//! WebhookPayload → LeadNotification → (Graph API) → map_lead() → LeadRecord
//! ```

pub mod mapping;
pub mod types;

pub use mapping::map_lead;
pub use types::{
    LeadNotification, LeadRecord, LeadgenValue, WebhookChange, WebhookEntry, WebhookPayload,
    LEADGEN_FIELD, PAGE_OBJECT,
};
