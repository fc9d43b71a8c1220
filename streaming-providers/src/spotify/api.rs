use crate::auth::{ClientCredentials, TokenSource};
use crate::error::Result;
use crate::http::{self, ClientOptions};
use crate::spotify::models::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

const API_BASE: &str = "https://api.spotify.com";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub struct SpotifyApi {
    client: Client,
    tokens: TokenSource,
    api_base: String,
}

impl SpotifyApi {
    /// Creates a client and fetches the first access token, so bad
    /// credentials fail here rather than on the first lookup.
    pub async fn new(credentials: ClientCredentials, options: &ClientOptions) -> Result<Self> {
        info!("Initializing Spotify API client");
        credentials.require("MIKU_SPOTIFY_CLIENT_ID", "MIKU_SPOTIFY_CLIENT_SECRET")?;

        let client = http::build_client(options)?;
        let tokens = TokenSource::new(
            client.clone(),
            options.token_url_or(TOKEN_URL),
            credentials,
            "spotify",
        );
        tokens.bearer().await?;

        Ok(Self {
            client,
            tokens,
            api_base: options.api_base_or(API_BASE),
        })
    }

    /// Get a track by its Spotify ID
    #[instrument(skip(self), fields(service = "spotify"))]
    pub async fn get_track(&self, id: &str) -> Result<Track> {
        info!("Fetching track {}", id);
        self.get(&format!("/v1/tracks/{}", id), &[], "Spotify track").await
    }

    /// Search the catalog for tracks carrying `isrc`, best match first
    #[instrument(skip(self), fields(service = "spotify"))]
    pub async fn search_isrc(&self, isrc: &str) -> Result<Vec<Track>> {
        info!("Searching tracks by ISRC {}", isrc);
        let query = format!("isrc:{}", isrc);
        let response: SearchResponse = self
            .get(
                "/v1/search",
                &[("q", query.as_str()), ("type", "track"), ("limit", "1")],
                "Spotify ISRC search",
            )
            .await?;

        let tracks = response.tracks.map(|t| t.items).unwrap_or_default();
        debug!("ISRC search returned {} tracks", tracks.len());
        Ok(tracks)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], what: &str) -> Result<T> {
        let token = self.tokens.bearer().await?;
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        http::read_json(response, what).await
    }
}
