use thiserror::Error;

use crate::common::constants::MAX_ERROR_BODY_BYTES;

/// Missing or invalid configuration, detected before any network call
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure retrieving records from the audit-log API
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid audit API URL: {0}")]
    InvalidUrl(String),

    #[error("Audit API request failed: {0}")]
    Transport(String),

    #[error("Audit API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed audit API response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Shared key is not valid base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),
}

/// Failure delivering a batch to the ingestion endpoint
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to serialize log entries: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to sign ingestion request: {0}")]
    Signature(#[from] SignatureError),

    #[error("Ingestion request failed: {0}")]
    Transport(String),

    #[error("Ingestion endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Any error that ends a forwarding run
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl ForwarderError {
    /// Pipeline stage the error came from, used as a metrics label
    pub fn stage(&self) -> &'static str {
        match self {
            ForwarderError::Config(_) => "config",
            ForwarderError::Fetch(_) => "fetch",
            ForwarderError::Publish(_) => "publish",
        }
    }
}

pub type Result<T> = std::result::Result<T, ForwarderError>;

/// Render a response body for an error message, cut at a char boundary
pub fn truncate_body(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_ERROR_BODY_BYTES {
        return text.into_owned();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
