use crate::models::{ProviderInfo, Song};
use serde::Deserialize;

/// Returned by search operations: one container per matching resource.
#[derive(Debug, Clone, Deserialize)]
pub struct List {
    #[serde(default)]
    pub data: Vec<ResourceContainer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceContainer {
    pub resource: Option<Resource>,
}

/// A track, album, video etc.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub artifact_type: String,
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
    /// Seconds
    #[serde(default)]
    pub duration: u32,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub main: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_cover: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl Resource {
    pub fn is_track(&self) -> bool {
        self.artifact_type == "track"
    }

    pub fn convert(&self, info: &ProviderInfo) -> Song {
        let artifact_type = if self.artifact_type.is_empty() {
            "track"
        } else {
            self.artifact_type.as_str()
        };

        // Main artists first; TIDAL does not guarantee the order
        let mut artists: Vec<&Artist> = self.artists.iter().collect();
        artists.sort_by_key(|a| !a.main);

        Song {
            provider: info.clone(),
            provider_url: format!("https://tidal.com/browse/{}/{}", artifact_type, self.id),
            isrc: self.isrc.clone(),
            title: self.title.clone(),
            artists: artists.into_iter().map(|a| a.name.clone()).collect(),
            album: self.album.title.clone(),
            album_art_url: self
                .album
                .image_cover
                .iter()
                .max_by_key(|i| i.width)
                .map(|i| i.url.clone()),
            duration_secs: (self.duration > 0).then_some(self.duration),
        }
    }
}
