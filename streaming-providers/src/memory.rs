//! In-memory provider backed by a fixed catalog.
//!
//! Useful for:
//! - Testing the resolution pipeline without network access
//! - Demonstrating how to implement the `StreamingProvider` trait

use crate::error::{ProviderError, Result};
use crate::models::{ProviderInfo, Song};
use crate::StreamingProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// How a `StaticProvider` fails every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Transport,
}

pub struct StaticProvider {
    info: ProviderInfo,
    by_url: HashMap<String, Song>,
    by_isrc: HashMap<String, Song>,
    delay: Option<Duration>,
    failure: Option<Failure>,
    lookups: AtomicUsize,
    searches: AtomicUsize,
}

impl StaticProvider {
    pub fn new(info: ProviderInfo) -> Self {
        Self {
            info,
            by_url: HashMap::new(),
            by_isrc: HashMap::new(),
            delay: None,
            failure: None,
            lookups: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    /// Add a song reachable by `url` and by its ISRC.
    ///
    /// The song is re-stamped with this provider's info.
    pub fn with_song(mut self, url: impl Into<String>, song: Song) -> Self {
        let song = self.stamp(song);
        if let Some(isrc) = song.normalized_isrc() {
            self.by_isrc.insert(isrc, song.clone());
        }
        self.by_url.insert(normalize_url(url.into()), song);
        self
    }

    /// Add a song only reachable through ISRC search.
    pub fn with_catalog_entry(mut self, song: Song) -> Self {
        let song = self.stamp(song);
        if let Some(isrc) = song.normalized_isrc() {
            self.by_isrc.insert(isrc, song);
        }
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call
    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn stamp(&self, mut song: Song) -> Song {
        song.provider = self.info.clone();
        song
    }

    async fn answer(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.failure {
            Some(Failure::NotFound) => Err(ProviderError::not_found(format!(
                "{} is configured to find nothing",
                self.info.identifier
            ))),
            Some(Failure::Transport) => Err(ProviderError::Api {
                status: 503,
                message: format!("{} is unavailable", self.info.identifier),
            }),
            None => Ok(()),
        }
    }
}

fn normalize_url(url: String) -> String {
    Url::parse(&url).map(|u| u.to_string()).unwrap_or(url)
}

#[async_trait]
impl StreamingProvider for StaticProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.answer().await?;

        self.by_url
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("{} does not know {}", self.info.identifier, url)))
    }

    async fn search(&self, song: &Song) -> Result<Song> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.answer().await?;

        let isrc = song
            .normalized_isrc()
            .ok_or_else(|| ProviderError::not_found("song has no ISRC"))?;

        self.by_isrc
            .get(&isrc)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("{} has no ISRC {}", self.info.identifier, isrc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderEmoji;
    use tokio_test::{assert_err, assert_ok};

    fn info(identifier: &str) -> ProviderInfo {
        ProviderInfo::new(identifier, identifier.to_uppercase(), ProviderEmoji::unicode("🎵"))
    }

    fn song(isrc: Option<&str>) -> Song {
        Song {
            provider: info("somewhere-else"),
            provider_url: "https://example.com/track/1".to_string(),
            isrc: isrc.map(str::to_string),
            title: "Song".to_string(),
            artists: vec!["Artist".to_string()],
            album: "Album".to_string(),
            album_art_url: None,
            duration_secs: Some(200),
        }
    }

    #[tokio::test]
    async fn test_lookup_and_search() {
        let provider = StaticProvider::new(info("memory")).with_song("https://memory.test/track/1", song(Some("US123")));

        let url = Url::parse("https://memory.test/track/1").unwrap();
        let found = assert_ok!(provider.lookup_song_by_url(&url).await);
        assert_eq!(found.provider.identifier, "memory");

        let matched = assert_ok!(provider.search(&song(Some("us123"))).await);
        assert_eq!(matched.title, "Song");

        let missing = assert_err!(provider.search(&song(Some("GB999"))).await);
        assert!(missing.is_not_found());
        let no_isrc = assert_err!(provider.search(&song(None)).await);
        assert!(no_isrc.is_not_found());

        assert_eq!(provider.lookup_calls(), 1);
        assert_eq!(provider.search_calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_modes() {
        let url = Url::parse("https://memory.test/track/1").unwrap();

        let down = StaticProvider::new(info("down"))
            .with_song("https://memory.test/track/1", song(Some("US123")))
            .failing(Failure::Transport);
        let err = assert_err!(down.lookup_song_by_url(&url).await);
        assert!(err.is_transport());

        let empty = StaticProvider::new(info("empty")).failing(Failure::NotFound);
        let err = assert_err!(empty.search(&song(Some("US123"))).await);
        assert!(err.is_not_found());
    }
}
