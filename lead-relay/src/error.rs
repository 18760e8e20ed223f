//! Errors raised by the outbound Graph and Notion clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response was not valid json: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("notion rejected the page (status {status}): {body}")]
    Notion { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, RelayError>;
