use crate::models::{ProviderInfo, Song};
use serde::Deserialize;
use std::collections::HashMap;

/// Spotify full track object
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    pub album: SimpleAlbum,
    #[serde(default)]
    pub external_ids: HashMap<String, String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Response of `GET /v1/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<Paging<Track>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl Track {
    pub fn convert(&self, info: &ProviderInfo) -> Song {
        let provider_url = self
            .external_urls
            .get("spotify")
            .cloned()
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", self.id));

        Song {
            provider: info.clone(),
            provider_url,
            isrc: self.external_ids.get("isrc").cloned(),
            title: self.name.clone(),
            artists: self.artists.iter().map(|a| a.name.clone()).collect(),
            album: self.album.name.clone(),
            // Spotify lists images widest first
            album_art_url: self.album.images.first().map(|i| i.url.clone()),
            duration_secs: Some((self.duration_ms / 1000) as u32),
        }
    }
}
