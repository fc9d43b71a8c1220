//! OAuth2 client-credentials tokens for Spotify and TIDAL.

use crate::error::{ProviderError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Fails with the name of the first blank credential.
    pub(crate) fn require(&self, id_name: &'static str, secret_name: &'static str) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(ProviderError::MissingCredential(id_name));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ProviderError::MissingCredential(secret_name));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Fetches and caches an access token, refreshing it when it goes stale.
pub(crate) struct TokenSource {
    client: Client,
    token_url: String,
    credentials: ClientCredentials,
    service: &'static str,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub(crate) fn new(
        client: Client,
        token_url: String,
        credentials: ClientCredentials,
        service: &'static str,
    ) -> Self {
        Self {
            client,
            token_url,
            credentials,
            service,
            cached: RwLock::new(None),
        }
    }

    /// Returns a valid bearer token.
    pub(crate) async fn bearer(&self) -> Result<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    #[instrument(skip(self), fields(service = self.service))]
    async fn fetch(&self) -> Result<CachedToken> {
        debug!("Requesting access token from {}", self.token_url);

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token request rejected with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        info!("Obtained access token, valid for {}s", lifetime.as_secs());

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
