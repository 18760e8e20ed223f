//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup into a [`Config`] value that is then
//! handed to the web layer and the outbound clients.

use std::env;
use tracing::warn;

/// How the webhook signature check treats requests it cannot evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Missing header, missing secret or empty body lets the request through.
    #[default]
    Permissive,
    /// Anything short of a matching signature is rejected.
    Strict,
}

impl SignaturePolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Meta app secret used to verify `X-Hub-Signature-256`
    pub fb_app_secret: Option<String>,

    /// Token expected in the subscription handshake
    pub fb_verify_token: Option<String>,

    /// Page access token passed to the Graph API
    pub fb_page_access_token: String,

    /// Graph API base URL (no trailing slash)
    pub graph_base_url: String,

    /// Graph API version segment, e.g. `v13.0`
    pub graph_api_version: String,

    /// Notion integration token
    pub notion_token: Option<String>,

    /// Notion database receiving one page per lead
    pub notion_database_id: Option<String>,

    /// Notion API base URL (no trailing slash)
    pub notion_base_url: String,

    pub signature_policy: SignaturePolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            port: lookup("PORT")
                .and_then(|v| parse_or_warn("PORT", &v))
                .unwrap_or(3000),

            fb_app_secret: non_empty(lookup("FB_APP_SECRET")),

            fb_verify_token: non_empty(lookup("FB_VERIFY_TOKEN")),

            fb_page_access_token: lookup("FB_PAGE_ACCESS_TOKEN").unwrap_or_default(),

            graph_base_url: base_url(lookup("GRAPH_API_BASE_URL"), "https://graph.facebook.com"),

            graph_api_version: non_empty(lookup("GRAPH_API_VERSION"))
                .unwrap_or_else(|| "v13.0".to_string()),

            notion_token: non_empty(lookup("NOTION_TOKEN")),

            notion_database_id: non_empty(lookup("NOTION_DB")),

            notion_base_url: base_url(lookup("NOTION_API_BASE_URL"), "https://api.notion.com"),

            signature_policy: lookup("SIGNATURE_POLICY")
                .map(|raw| {
                    SignaturePolicy::parse(&raw).unwrap_or_else(|| {
                        warn!(env_var = "SIGNATURE_POLICY", value = %raw, "Invalid policy, using permissive");
                        SignaturePolicy::Permissive
                    })
                })
                .unwrap_or_default(),
        }
    }

    /// Whether both Notion settings are present, enabling enrichment and publishing.
    pub fn relay_enabled(&self) -> bool {
        self.notion_token.is_some() && self.notion_database_id.is_some()
    }
}

fn parse_or_warn<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            None
        }
    }
}

/// Treat blank values the same as unset ones.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn base_url(value: Option<String>, default: &str) -> String {
    non_empty(value)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string())
}
