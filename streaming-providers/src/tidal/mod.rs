//! TIDAL Open API provider.

pub mod api;
pub mod models;

use crate::auth::ClientCredentials;
use crate::error::{ProviderError, Result};
use crate::http::ClientOptions;
use crate::models::{ProviderEmoji, ProviderInfo, Song};
use crate::StreamingProvider;
use api::TidalApi;
use async_trait::async_trait;
use url::Url;

const HOSTNAME: &str = "tidal.com";

pub const DEFAULT_COUNTRY_CODE: &str = "US";

pub struct TidalProvider {
    api: TidalApi,
    info: ProviderInfo,
    country_code: String,
}

impl TidalProvider {
    pub async fn new(credentials: ClientCredentials, country_code: &str, options: ClientOptions) -> Result<Self> {
        let api = TidalApi::new(credentials, &options).await?;
        Ok(Self {
            api,
            info: Self::provider_info(),
            country_code: country_code.to_ascii_uppercase(),
        })
    }

    pub fn provider_info() -> ProviderInfo {
        ProviderInfo::new(
            "tidal",
            "TIDAL",
            ProviderEmoji::custom("1184003400724131920", "tidal"),
        )
        .with_hostname(HOSTNAME)
    }
}

/// Extracts the track ID from a TIDAL link. Supported shapes:
///
/// - `https://tidal.com/browse/track/115453632`
/// - `https://tidal.com/track/115453632`
/// - `https://listen.tidal.com/track/115453632/u`
pub fn parse_track_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host != HOSTNAME && !host.ends_with(".tidal.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let rest = match segments.as_slice() {
        ["browse", rest @ ..] => rest,
        rest => rest,
    };

    match rest {
        ["track", id] | ["track", id, _] if id.chars().all(|c| c.is_ascii_digit()) => Some(id.to_string()),
        _ => None,
    }
}

#[async_trait]
impl StreamingProvider for TidalProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song> {
        let id = parse_track_id(url)
            .ok_or_else(|| ProviderError::not_found(format!("not a TIDAL track link: {}", url)))?;

        let resource = self.api.get_by_id(&id, &self.country_code).await?;
        if !resource.is_track() {
            return Err(ProviderError::not_found(format!(
                "TIDAL ID {} is a {}, not a track",
                id, resource.artifact_type
            )));
        }

        Ok(resource.convert(&self.info))
    }

    async fn search(&self, song: &Song) -> Result<Song> {
        let isrc = song
            .normalized_isrc()
            .ok_or_else(|| ProviderError::not_found("song has no ISRC"))?;

        let resource = self.api.get_by_isrc(&isrc, &self.country_code).await?;
        if !resource.is_track() {
            return Err(ProviderError::not_found(format!(
                "ISRC {} resolved to a {}, not a track",
                isrc, resource.artifact_type
            )));
        }

        Ok(resource.convert(&self.info))
    }
}
