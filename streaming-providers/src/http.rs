//! HTTP plumbing shared by the catalog clients.

use crate::error::{ProviderError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("miku-streaming-providers/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in an `Api` error message.
const MAX_ERROR_BODY: usize = 512;

/// Options shared by every catalog client.
///
/// The base URL overrides exist so a client can be pointed at a local
/// stand-in of the catalog API.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
    /// Overrides the catalog API base URL
    pub api_base: Option<String>,
    /// Overrides the OAuth token endpoint
    pub token_url: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            api_base: None,
            token_url: None,
        }
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = Some(token_url.into());
        self
    }

    pub(crate) fn api_base_or(&self, default: &str) -> String {
        self.api_base
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub(crate) fn token_url_or(&self, default: &str) -> String {
        self.token_url.clone().unwrap_or_else(|| default.to_string())
    }
}

pub(crate) fn build_client(options: &ClientOptions) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(options.timeout)
        .build()?)
}

/// Decodes a catalog response, mapping 404 to `NotFound` and every other
/// non-2xx status to `Api`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();
    let text = response.text().await?;
    debug!("{} response from {}: HTTP {}, {} bytes", what, url.path(), status.as_u16(), text.len());

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::not_found(format!("{} does not exist", what)));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::Auth(format!(
            "{} rejected with HTTP {}",
            what,
            status.as_u16()
        )));
    }

    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: truncate(&text, MAX_ERROR_BODY),
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse {} response: {}", what, e);
        ProviderError::JsonParse(e)
    })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
