//! Notion client for writing leads as database pages.
//!
//! Each lead becomes one page in the configured database. Property names match
//! the columns of the lead database:
//!
//! | Property        | Notion type |
//! |-----------------|-------------|
//! | `SL`            | number      |
//! | `Full Name`     | title       |
//! | `Hospital Name` | rich_text   |
//! | `Phone Number`  | rich_text   |
//! | `Location`      | rich_text   |

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::{RelayError, Result};
use crate::lead::LeadRecord;
use crate::relay::RecordSink;

/// Notion API version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Client for the Notion "create page" endpoint.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
            database_id: database_id.into(),
        }
    }

    /// Build the `pages.create` request body for a record.
    pub fn page_body(&self, record: &LeadRecord) -> Value {
        json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                "SL": { "number": record.serial },
                "Full Name": { "title": [text(&record.full_name)] },
                "Hospital Name": { "rich_text": [text(&record.hospital_name)] },
                "Phone Number": { "rich_text": [text(&record.phone_number)] },
                "Location": { "rich_text": [text(&record.location)] },
            }
        })
    }

    /// Create a page for the record.
    ///
    /// Returns the id of the created page.
    pub async fn create_page(&self, record: &LeadRecord) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/v1/pages", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&self.page_body(record))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Notion {
                status: status.as_u16(),
                body,
            });
        }

        let page: Value = response.json().await?;
        Ok(page.get("id").and_then(Value::as_str).map(str::to_string))
    }
}

fn text(content: &str) -> Value {
    json!({ "text": { "content": content } })
}

#[async_trait]
impl RecordSink for NotionClient {
    async fn publish(&self, record: &LeadRecord) {
        match self.create_page(record).await {
            Ok(page_id) => {
                info!(
                    serial = record.serial,
                    page_id = ?page_id,
                    "notion_page_created"
                );
            }
            Err(e) => {
                error!(serial = record.serial, error = %e, "notion_page_create_failed");
            }
        }
    }
}
