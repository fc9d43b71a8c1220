//! Apple Music API provider.

pub mod api;
pub mod models;

use crate::error::{ProviderError, Result};
use crate::http::ClientOptions;
use crate::models::{ProviderEmoji, ProviderInfo, Song};
use crate::StreamingProvider;
use api::AppleMusicApi;
use async_trait::async_trait;
use url::Url;

const HOSTNAME: &str = "music.apple.com";

pub const DEFAULT_STOREFRONT: &str = "us";

pub struct AppleMusicProvider {
    api: AppleMusicApi,
    info: ProviderInfo,
    /// Storefront used for ISRC searches
    storefront: String,
}

/// Song reference parsed from an Apple Music link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub storefront: String,
    pub song_id: String,
}

impl AppleMusicProvider {
    pub async fn new(token: String, storefront: &str, options: ClientOptions) -> Result<Self> {
        let storefront = storefront.to_ascii_lowercase();
        let api = AppleMusicApi::new(token, &storefront, &options).await?;
        Ok(Self {
            api,
            info: Self::provider_info(),
            storefront,
        })
    }

    pub fn provider_info() -> ProviderInfo {
        ProviderInfo::new(
            "applemusic",
            "Apple Music",
            ProviderEmoji::custom("1170380264711667822", "applemusic"),
        )
        .with_hostname(HOSTNAME)
    }

    fn first_song(&self, response: models::SongsResponse, what: &str) -> Result<Song> {
        response
            .data
            .iter()
            .find_map(|resource| resource.convert(&self.info))
            .ok_or_else(|| ProviderError::not_found(format!("no Apple Music song for {}", what)))
    }
}

/// Parses an Apple Music song link. Supported shapes:
///
/// - `https://music.apple.com/us/album/album-name/123456789?i=987654321`
/// - `https://music.apple.com/us/song/song-name/987654321`
/// - `https://music.apple.com/us/song/987654321`
pub fn parse_song_ref(url: &Url) -> Option<SongRef> {
    let host = url.host_str()?;
    if host != HOSTNAME && !host.ends_with(".music.apple.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let (storefront, kind) = match segments.as_slice() {
        [storefront, kind, ..] if is_storefront(storefront) => (storefront.to_ascii_lowercase(), *kind),
        _ => return None,
    };

    let song_id = match kind {
        "album" => url
            .query_pairs()
            .find(|(key, _)| key == "i")
            .map(|(_, value)| value.into_owned())?,
        "song" => segments.last()?.to_string(),
        _ => return None,
    };

    if song_id.is_empty() || !song_id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(SongRef { storefront, song_id })
}

fn is_storefront(segment: &str) -> bool {
    segment.len() == 2 && segment.chars().all(|c| c.is_ascii_alphabetic())
}

#[async_trait]
impl StreamingProvider for AppleMusicProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song> {
        let song_ref = parse_song_ref(url)
            .ok_or_else(|| ProviderError::not_found(format!("not an Apple Music song link: {}", url)))?;

        let response = self.api.get_song(&song_ref.storefront, &song_ref.song_id).await?;
        if response.data.len() > 1 {
            return Err(ProviderError::not_found(format!(
                "{} songs returned for ID {}, refusing to guess",
                response.data.len(),
                song_ref.song_id
            )));
        }

        self.first_song(response, &format!("ID {}", song_ref.song_id))
    }

    async fn search(&self, song: &Song) -> Result<Song> {
        let isrc = song
            .normalized_isrc()
            .ok_or_else(|| ProviderError::not_found("song has no ISRC"))?;

        let response = self.api.get_songs_by_isrc(&self.storefront, &isrc).await?;
        self.first_song(response, &format!("ISRC {}", isrc))
    }
}
