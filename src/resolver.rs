//! Resolve a streaming link to the same song on every other provider.
//!
//! Resolution happens in two phases:
//! 1. Classify the link: walk the registry in order until one provider can
//!    look the song up. That provider is the origin and its song the
//!    canonical song.
//! 2. Fan out: ask every other provider to find the canonical song by ISRC.
//!
//! Individual provider failures never fail a resolution. They are logged and
//! kept in the attempt list.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use streaming_providers::{ProviderError, ProviderInfo, Song, StreamingProvider, Url};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::registry::ProviderRegistry;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("No provider recognized {url}")]
    OriginNotFound { url: String },

    #[error("No alternatives found for '{}' on {}", .canonical.title, .canonical.provider.display_name)]
    NoAlternativesFound { canonical: Box<Song> },
}

/// How alternatives are searched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOut {
    /// All providers at once
    #[default]
    Parallel,
    /// One provider at a time, in registry order
    Sequential,
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Deadline for each individual provider call
    pub call_timeout: Duration,
    pub fan_out: FanOut,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            fan_out: FanOut::Parallel,
        }
    }
}

/// One provider's answer to the alternative search
#[derive(Debug)]
pub struct SearchAttempt {
    pub provider: ProviderInfo,
    pub result: Result<Song, ProviderError>,
}

impl SearchAttempt {
    pub fn song(&self) -> Option<&Song> {
        self.result.as_ref().ok()
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub canonical: Song,
    /// One attempt per non-origin provider, in registry order
    pub attempts: Vec<SearchAttempt>,
}

impl Resolution {
    /// Songs found on other providers, in registry order
    pub fn alternatives(&self) -> Vec<&Song> {
        self.attempts.iter().filter_map(SearchAttempt::song).collect()
    }

    pub fn into_parts(self) -> (Song, Vec<Song>) {
        let alternatives = self
            .attempts
            .into_iter()
            .filter_map(|attempt| attempt.result.ok())
            .collect();
        (self.canonical, alternatives)
    }
}

pub struct Resolver {
    registry: Arc<ProviderRegistry>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(registry: Arc<ProviderRegistry>, options: ResolverOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn resolve(&self, url: &str) -> Result<Resolution, ResolveError> {
        let url = url.trim();
        let parsed = Url::parse(url).map_err(|source| ResolveError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let (origin, canonical) =
            self.find_origin(&parsed)
                .await
                .ok_or_else(|| ResolveError::OriginNotFound {
                    url: url.to_string(),
                })?;

        let attempts = self.find_alternatives(&origin, &canonical).await;

        if !attempts.iter().any(|attempt| attempt.result.is_ok()) {
            return Err(ResolveError::NoAlternativesFound {
                canonical: Box::new(canonical),
            });
        }

        Ok(Resolution {
            canonical,
            attempts,
        })
    }

    /// Find the provider a link belongs to and the song it points at.
    ///
    /// Returns the origin's identifier with the song.
    pub async fn find_origin(&self, url: &Url) -> Option<(String, Song)> {
        let host = url.host_str().unwrap_or_default();
        let claimed = self.registry.claims_host(host);

        for provider in self.registry.iter() {
            let info = provider.info();

            match &info.url_hostname {
                Some(hostname) if !info.matches_host(host) => {
                    debug!("Skipping {}: {} is not {}", info.identifier, host, hostname);
                    continue;
                }
                None if claimed => {
                    debug!("Skipping {}: {} belongs to another provider", info.identifier, host);
                    continue;
                }
                _ => {}
            }

            debug!("Looking up {} with {}", url, info.identifier);
            match self.bounded(provider.lookup_song_by_url(url)).await {
                Ok(song) => {
                    info!(
                        "Found song '{}' by {} on {}",
                        song.title,
                        song.artists.join(", "),
                        info.display_name
                    );
                    return Some((info.identifier.clone(), song));
                }
                Err(e) => debug!("{} could not look up {}: {}", info.identifier, url, e),
            }
        }

        debug!("No provider recognized {}", url);
        None
    }

    /// Search every provider except `origin` for `canonical`.
    ///
    /// Attempts come back in registry order whatever the fan-out mode.
    pub async fn find_alternatives(&self, origin: &str, canonical: &Song) -> Vec<SearchAttempt> {
        let candidates = self
            .registry
            .iter()
            .filter(|provider| provider.info().identifier != origin);

        match self.options.fan_out {
            FanOut::Parallel => join_all(candidates.map(|provider| self.attempt(provider, canonical))).await,
            FanOut::Sequential => {
                let mut attempts = Vec::with_capacity(self.registry.len());
                for provider in candidates {
                    attempts.push(self.attempt(provider, canonical).await);
                }
                attempts
            }
        }
    }

    async fn attempt(&self, provider: &dyn StreamingProvider, canonical: &Song) -> SearchAttempt {
        let info = provider.info();
        debug!("Searching {} for '{}'", info.identifier, canonical.title);

        let result = self.bounded(provider.search(canonical)).await;
        match &result {
            Ok(song) => info!("Found alternative on {}: {}", info.display_name, song.provider_url),
            Err(e) if e.is_not_found() => debug!("{} has no match: {}", info.identifier, e),
            Err(e) => warn!("{} search failed: {}", info.identifier, e),
        }

        SearchAttempt {
            provider: info.clone(),
            result,
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<Song, ProviderError>
    where
        F: Future<Output = Result<Song, ProviderError>>,
    {
        let limit = self.options.call_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streaming_providers::memory::Failure;
    use streaming_providers::{ProviderEmoji, StaticProvider};

    const SPOTIFY_URL: &str = "https://open.spotify.com/track/111";
    const TIDAL_URL: &str = "https://tidal.com/browse/track/222";

    fn spotify() -> ProviderInfo {
        ProviderInfo::new("spotify", "Spotify", ProviderEmoji::unicode("🟢"))
    }

    fn apple() -> ProviderInfo {
        ProviderInfo::new("applemusic", "Apple Music", ProviderEmoji::unicode("🍎"))
            .with_hostname("music.apple.com")
    }

    fn tidal() -> ProviderInfo {
        ProviderInfo::new("tidal", "TIDAL", ProviderEmoji::unicode("🌊")).with_hostname("tidal.com")
    }

    fn song(url: &str, isrc: Option<&str>) -> Song {
        Song {
            provider: spotify(),
            provider_url: url.to_string(),
            isrc: isrc.map(str::to_string),
            title: "A".to_string(),
            artists: vec!["X".to_string()],
            album: "Album".to_string(),
            album_art_url: None,
            duration_secs: Some(200),
        }
    }

    fn resolver(providers: Vec<Box<dyn StreamingProvider>>, options: ResolverOptions) -> Resolver {
        Resolver::new(Arc::new(ProviderRegistry::new(providers).unwrap()), options)
    }

    fn identifiers(resolution: &Resolution) -> Vec<&str> {
        resolution
            .alternatives()
            .iter()
            .map(|song| song.provider.identifier.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_spotify_link_resolves_to_apple_music() {
        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(
                    StaticProvider::new(apple())
                        .with_catalog_entry(song("https://music.apple.com/us/song/333", Some("US123"))),
                ),
                Box::new(StaticProvider::new(tidal()).failing(Failure::NotFound)),
            ],
            ResolverOptions::default(),
        );

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(resolution.canonical.provider.identifier, "spotify");
        assert_eq!(identifiers(&resolution), ["applemusic"]);

        assert_eq!(resolution.attempts.len(), 2);
        assert_eq!(resolution.attempts[1].provider.identifier, "tidal");
        assert!(resolution.attempts[1].result.as_ref().unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_claimed_host_never_reaches_other_providers() {
        let spotify = Arc::new(StaticProvider::new(spotify()));
        let apple = Arc::new(StaticProvider::new(apple()));
        let tidal = Arc::new(StaticProvider::new(tidal()).with_song(TIDAL_URL, song(TIDAL_URL, Some("US123"))));

        let resolver = resolver(
            vec![Box::new(spotify.clone()), Box::new(apple.clone()), Box::new(tidal.clone())],
            ResolverOptions::default(),
        );

        let err = resolver.resolve(TIDAL_URL).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoAlternativesFound { .. }));

        assert_eq!(spotify.lookup_calls(), 0);
        assert_eq!(apple.lookup_calls(), 0);
        assert_eq!(tidal.lookup_calls(), 1);

        // subdomains are claimed too
        let err = resolver.resolve("https://listen.tidal.com/track/9").await.unwrap_err();
        assert!(matches!(err, ResolveError::OriginNotFound { .. }));
        assert_eq!(spotify.lookup_calls(), 0);
        assert_eq!(tidal.lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_classification_stops_at_first_match() {
        let first = Arc::new(
            StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123"))),
        );
        let mirror = ProviderInfo::new("mirror", "Mirror", ProviderEmoji::unicode("🪞"));
        let second = Arc::new(
            StaticProvider::new(mirror).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123"))),
        );

        let resolver = resolver(vec![Box::new(first.clone()), Box::new(second.clone())], ResolverOptions::default());

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(resolution.canonical.provider.identifier, "spotify");
        assert_eq!(identifiers(&resolution), ["mirror"]);

        assert_eq!(first.lookup_calls(), 1);
        assert_eq!(second.lookup_calls(), 0);
        assert_eq!(second.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_origin_is_never_an_alternative() {
        let spotify = Arc::new(
            StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123"))),
        );
        let tidal = StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")));

        let resolver = resolver(vec![Box::new(spotify.clone()), Box::new(tidal)], ResolverOptions::default());

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(identifiers(&resolution), ["tidal"]);
        assert_eq!(spotify.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_parallel_fan_out_keeps_registry_order() {
        let slow = StaticProvider::new(apple())
            .with_catalog_entry(song("https://music.apple.com/us/song/333", Some("US123")))
            .with_delay(Duration::from_millis(150));
        let fast = StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")));

        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(slow),
                Box::new(fast),
            ],
            ResolverOptions::default(),
        );

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(identifiers(&resolution), ["applemusic", "tidal"]);
    }

    #[tokio::test]
    async fn test_sequential_fan_out_matches_parallel() {
        let providers = || -> Vec<Box<dyn StreamingProvider>> {
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(StaticProvider::new(apple()).failing(Failure::Transport)),
                Box::new(StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")))),
            ]
        };

        let sequential = resolver(
            providers(),
            ResolverOptions {
                fan_out: FanOut::Sequential,
                ..Default::default()
            },
        );
        let parallel = resolver(providers(), ResolverOptions::default());

        let a = sequential.resolve(SPOTIFY_URL).await.unwrap();
        let b = parallel.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(identifiers(&a), ["tidal"]);
        assert_eq!(identifiers(&a), identifiers(&b));
        assert!(a.attempts[0].result.as_ref().unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_slow_search_times_out() {
        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(
                    StaticProvider::new(apple())
                        .with_catalog_entry(song("https://music.apple.com/us/song/333", Some("US123")))
                        .with_delay(Duration::from_secs(5)),
                ),
                Box::new(StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")))),
            ],
            ResolverOptions {
                call_timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(identifiers(&resolution), ["tidal"]);
        assert!(matches!(
            resolution.attempts[0].result,
            Err(ProviderError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_no_alternatives_carries_canonical() {
        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(StaticProvider::new(apple()).failing(Failure::Transport)),
                Box::new(StaticProvider::new(tidal()).failing(Failure::NotFound)),
            ],
            ResolverOptions::default(),
        );

        match resolver.resolve(SPOTIFY_URL).await {
            Err(ResolveError::NoAlternativesFound { canonical }) => {
                assert_eq!(canonical.provider.identifier, "spotify");
                assert_eq!(canonical.provider_url, SPOTIFY_URL);
            }
            other => panic!("expected NoAlternativesFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_song_without_isrc_has_no_alternatives() {
        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, None))),
                Box::new(StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")))),
            ],
            ResolverOptions::default(),
        );

        let err = resolver.resolve(SPOTIFY_URL).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoAlternativesFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_link_is_origin_not_found() {
        let spotify = Arc::new(StaticProvider::new(spotify()));
        let tidal = Arc::new(StaticProvider::new(tidal()));
        let resolver = resolver(vec![Box::new(spotify.clone()), Box::new(tidal.clone())], ResolverOptions::default());

        let err = resolver.resolve("https://example.com/song/1").await.unwrap_err();
        assert!(matches!(err, ResolveError::OriginNotFound { .. }));
        // the hostname-less provider was asked, the scoped one was not
        assert_eq!(spotify.lookup_calls(), 1);
        assert_eq!(tidal.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn test_classification_continues_past_failures() {
        let broken = StaticProvider::new(ProviderInfo::new("broken", "Broken", ProviderEmoji::unicode("💥")))
            .failing(Failure::Transport);
        let resolver = resolver(
            vec![
                Box::new(broken),
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("US123")))),
            ],
            ResolverOptions::default(),
        );

        let resolution = resolver.resolve(SPOTIFY_URL).await.unwrap();
        assert_eq!(resolution.canonical.provider.identifier, "spotify");
        // the broken provider is still searched and fails quietly
        assert_eq!(resolution.attempts.len(), 2);
        assert_eq!(identifiers(&resolution), ["tidal"]);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let resolver = resolver(vec![Box::new(StaticProvider::new(spotify()))], ResolverOptions::default());

        let err = resolver.resolve("not a link").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_into_parts() {
        let resolver = resolver(
            vec![
                Box::new(StaticProvider::new(spotify()).with_song(SPOTIFY_URL, song(SPOTIFY_URL, Some("US123")))),
                Box::new(StaticProvider::new(apple()).failing(Failure::NotFound)),
                Box::new(StaticProvider::new(tidal()).with_catalog_entry(song(TIDAL_URL, Some("us123")))),
            ],
            ResolverOptions::default(),
        );

        let (canonical, alternatives) = resolver.resolve(SPOTIFY_URL).await.unwrap().into_parts();
        assert_eq!(canonical.provider_url, SPOTIFY_URL);
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].provider_url, TIDAL_URL);
    }
}
