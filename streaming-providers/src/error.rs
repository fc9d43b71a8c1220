use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

impl ProviderError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ProviderError::NotFound(msg.into())
    }

    /// The catalog answered, it just doesn't have the item.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    /// Network, auth, rate-limit or decoding trouble talking to the catalog.
    pub fn is_transport(&self) -> bool {
        !self.is_not_found() && !matches!(self, ProviderError::MissingCredential(_))
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
