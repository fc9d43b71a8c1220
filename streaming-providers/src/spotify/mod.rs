//! Spotify Web API provider.

pub mod api;
pub mod models;

use crate::auth::ClientCredentials;
use crate::error::{ProviderError, Result};
use crate::http::ClientOptions;
use crate::models::{ProviderEmoji, ProviderInfo, Song};
use crate::StreamingProvider;
use api::SpotifyApi;
use async_trait::async_trait;
use url::Url;

const HOSTNAME: &str = "open.spotify.com";

pub struct SpotifyProvider {
    api: SpotifyApi,
    info: ProviderInfo,
}

impl SpotifyProvider {
    pub async fn new(credentials: ClientCredentials, options: ClientOptions) -> Result<Self> {
        let api = SpotifyApi::new(credentials, &options).await?;
        Ok(Self {
            api,
            info: Self::provider_info(),
        })
    }

    /// Spotify declares no hostname: its links are validated by
    /// `parse_track_id` instead.
    pub fn provider_info() -> ProviderInfo {
        ProviderInfo::new(
            "spotify",
            "Spotify",
            ProviderEmoji::custom("1170379904395771904", "spotify"),
        )
    }
}

/// Extracts the track ID from a Spotify link.
///
/// Accepts `https://open.spotify.com/track/{id}` with an optional
/// `intl-xx` locale segment in front of `track`.
pub fn parse_track_id(url: &Url) -> Option<String> {
    if url.host_str() != Some(HOSTNAME) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let rest = match segments.as_slice() {
        [locale, rest @ ..] if locale.starts_with("intl-") => rest,
        rest => rest,
    };

    match rest {
        ["track", id] if is_spotify_id(id) => Some(id.to_string()),
        _ => None,
    }
}

fn is_spotify_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl StreamingProvider for SpotifyProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song> {
        let id = parse_track_id(url)
            .ok_or_else(|| ProviderError::not_found(format!("not a Spotify track link: {}", url)))?;

        let track = self.api.get_track(&id).await?;
        Ok(track.convert(&self.info))
    }

    async fn search(&self, song: &Song) -> Result<Song> {
        let isrc = song
            .normalized_isrc()
            .ok_or_else(|| ProviderError::not_found("song has no ISRC"))?;

        let tracks = self.api.search_isrc(&isrc).await?;
        let track = tracks
            .first()
            .ok_or_else(|| ProviderError::not_found(format!("no Spotify track with ISRC {}", isrc)))?;

        Ok(track.convert(&self.info))
    }
}
