//! Graph API client for fetching full lead details.
//!
//! One GET per lead, authenticated with a page access token in the query
//! string. No timeout and no retry are applied.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;
use crate::relay::LeadSource;
use crate::Config;

/// Client for the lead-detail endpoint of the Graph API.
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    api_version: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_version: api_version.into(),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.graph_base_url.clone(),
            config.graph_api_version.clone(),
            config.fb_page_access_token.clone(),
        )
    }

    fn lead_url(&self, leadgen_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, leadgen_id)
    }

    /// Fetch a lead and decode the response body as JSON.
    ///
    /// The HTTP status is not inspected: a Graph error object is valid JSON
    /// and is returned like any other body.
    pub async fn fetch_lead(&self, leadgen_id: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.lead_url(leadgen_id))
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let lead: Value = serde_json::from_slice(&bytes)?;

        info!(
            leadgen_id = leadgen_id,
            status_code = status,
            body_length = bytes.len(),
            "graph_lead_fetched"
        );

        Ok(lead)
    }
}

#[async_trait]
impl LeadSource for GraphClient {
    async fn fetch_lead(&self, leadgen_id: &str) -> Option<Value> {
        match GraphClient::fetch_lead(self, leadgen_id).await {
            Ok(lead) => Some(lead),
            Err(e) => {
                error!(leadgen_id = leadgen_id, error = %e, "graph_lead_fetch_failed");
                None
            }
        }
    }
}
