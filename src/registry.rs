//! The ordered set of enabled streaming providers.
//!
//! Assembled once at startup and shared behind an `Arc`. Order matters: it
//! is the priority used when classifying a link, and the order in which
//! alternatives are presented.

use anyhow::{Context, Result};
use streaming_providers::{
    AppleMusicProvider, ClientCredentials, ProviderInfo, SpotifyProvider, StreamingProvider,
    TidalProvider,
};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, ProviderKind};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No providers are enabled")]
    Empty,

    #[error("Provider '{0}' is registered more than once")]
    Duplicate(String),
}

pub struct ProviderRegistry {
    providers: Vec<Box<dyn StreamingProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Box<dyn StreamingProvider>>) -> Result<Self, RegistryError> {
        if providers.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (i, provider) in providers.iter().enumerate() {
            let identifier = &provider.info().identifier;
            if providers[..i].iter().any(|p| p.info().identifier == *identifier) {
                return Err(RegistryError::Duplicate(identifier.clone()));
            }
        }

        Ok(Self { providers })
    }

    /// Create every configured provider, in configured order.
    ///
    /// A provider that cannot be created is fatal: running with a silently
    /// missing catalog would only show up later as fewer alternatives.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut providers = Vec::with_capacity(config.providers.len());

        for kind in &config.providers {
            let provider = build_provider(*kind, config)
                .await
                .with_context(|| format!("Failed to create {} provider", kind))?;
            info!("Enabled provider: {}", provider.info().display_name);
            providers.push(provider);
        }

        Ok(Self::new(providers)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn StreamingProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn infos(&self) -> Vec<ProviderInfo> {
        self.iter().map(|p| p.info().clone()).collect()
    }

    /// True if some provider declares `host` (or a parent domain of it) as
    /// its link hostname.
    pub fn claims_host(&self, host: &str) -> bool {
        self.iter().any(|p| p.info().matches_host(host))
    }
}

async fn build_provider(
    kind: ProviderKind,
    config: &Config,
) -> streaming_providers::Result<Box<dyn StreamingProvider>> {
    let credentials = &config.credentials;
    let options = config.client_options();

    let provider: Box<dyn StreamingProvider> = match kind {
        ProviderKind::Spotify => Box::new(
            SpotifyProvider::new(
                ClientCredentials::new(
                    &credentials.spotify_client_id,
                    &credentials.spotify_client_secret,
                ),
                options,
            )
            .await?,
        ),
        ProviderKind::AppleMusic => Box::new(
            AppleMusicProvider::new(
                credentials.apple_music_token.clone(),
                &config.apple_music_storefront,
                options,
            )
            .await?,
        ),
        ProviderKind::Tidal => Box::new(
            TidalProvider::new(
                ClientCredentials::new(&credentials.tidal_client_id, &credentials.tidal_client_secret),
                &config.tidal_country_code,
                options,
            )
            .await?,
        ),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use streaming_providers::{ProviderEmoji, StaticProvider};

    fn provider(identifier: &str, hostname: Option<&str>) -> Box<dyn StreamingProvider> {
        let mut info = ProviderInfo::new(identifier, identifier, ProviderEmoji::unicode("🎵"));
        if let Some(hostname) = hostname {
            info = info.with_hostname(hostname);
        }
        Box::new(StaticProvider::new(info))
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert_eq!(ProviderRegistry::new(Vec::new()).err(), Some(RegistryError::Empty));

        let err = ProviderRegistry::new(vec![provider("tidal", None), provider("tidal", None)]).err();
        assert_eq!(err, Some(RegistryError::Duplicate("tidal".to_string())));
    }

    #[test]
    fn test_preserves_order_and_claims_hosts() {
        let registry = ProviderRegistry::new(vec![
            provider("spotify", None),
            provider("applemusic", Some("music.apple.com")),
            provider("tidal", Some("tidal.com")),
        ])
        .unwrap();

        let ids: Vec<_> = registry.iter().map(|p| p.info().identifier.clone()).collect();
        assert_eq!(ids, ["spotify", "applemusic", "tidal"]);
        assert_eq!(registry.len(), 3);

        assert!(registry.claims_host("listen.tidal.com"));
        assert!(registry.claims_host("music.apple.com"));
        assert!(!registry.claims_host("open.spotify.com"));
    }

    #[tokio::test]
    async fn test_missing_credentials_abort_startup() {
        let config = Config::try_parse_from(["miku", "--providers", "spotify"]).unwrap();
        let err = ProviderRegistry::from_config(&config).await.err().unwrap();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to create Spotify provider"), "{}", message);
        assert!(message.contains("MIKU_SPOTIFY_CLIENT_ID"), "{}", message);
    }
}
