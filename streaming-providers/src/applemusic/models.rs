use crate::models::{ProviderInfo, Song};
use serde::Deserialize;

/// Edge length requested from the artwork URL template.
pub const ARTWORK_SIZE: u32 = 300;

/// Response of the catalog song endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SongsResponse {
    #[serde(default)]
    pub data: Vec<SongResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongResource {
    pub id: String,
    pub attributes: Option<SongAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_name: String,
    pub url: String,
    pub isrc: Option<String>,
    pub duration_in_millis: Option<u64>,
    pub artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artwork {
    /// Template with `{w}` and `{h}` placeholders
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Artwork {
    pub fn sized_url(&self, size: u32) -> String {
        let size = size.to_string();
        self.url.replace("{w}", &size).replace("{h}", &size)
    }
}

/// Response of `GET /v1/storefronts/{id}`, only used to validate the token
#[derive(Debug, Clone, Deserialize)]
pub struct StorefrontsResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl SongResource {
    /// `None` when the catalog returned the resource without attributes.
    pub fn convert(&self, info: &ProviderInfo) -> Option<Song> {
        let attributes = self.attributes.as_ref()?;

        Some(Song {
            provider: info.clone(),
            provider_url: attributes.url.clone(),
            isrc: attributes.isrc.clone(),
            title: attributes.name.clone(),
            // Apple Music only exposes a display string for the artists
            artists: vec![attributes.artist_name.clone()],
            album: attributes.album_name.clone(),
            album_art_url: attributes.artwork.as_ref().map(|a| a.sized_url(ARTWORK_SIZE)),
            duration_secs: attributes.duration_in_millis.map(|ms| (ms / 1000) as u32),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artwork_template() {
        let artwork = Artwork {
            url: "https://is1-ssl.mzstatic.com/image/thumb/Music/{w}x{h}bb.jpg".to_string(),
            width: Some(3000),
            height: Some(3000),
        };
        assert_eq!(
            artwork.sized_url(300),
            "https://is1-ssl.mzstatic.com/image/thumb/Music/300x300bb.jpg"
        );
    }

    #[test]
    fn test_convert_song_resource() {
        let json = r#"{
            "id": "1440818839",
            "type": "songs",
            "attributes": {
                "name": "Never Gonna Give You Up",
                "artistName": "Rick Astley",
                "albumName": "Whenever You Need Somebody",
                "url": "https://music.apple.com/us/album/never-gonna-give-you-up/1440818584?i=1440818839",
                "isrc": "GBARL9300135",
                "durationInMillis": 213573,
                "artwork": { "url": "https://example.com/{w}x{h}bb.jpg", "width": 1400, "height": 1400 }
            }
        }"#;
        let resource: SongResource = serde_json::from_str(json).unwrap();
        let info = crate::applemusic::AppleMusicProvider::provider_info();
        let song = resource.convert(&info).unwrap();

        assert_eq!(song.title, "Never Gonna Give You Up");
        assert_eq!(song.artists, vec!["Rick Astley".to_string()]);
        assert_eq!(song.isrc.as_deref(), Some("GBARL9300135"));
        assert_eq!(song.duration_secs, Some(213));
        assert_eq!(song.album_art_url.as_deref(), Some("https://example.com/300x300bb.jpg"));
        assert_eq!(song.provider.identifier, "applemusic");
    }
}
