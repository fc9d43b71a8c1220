use crate::applemusic::models::*;
use crate::error::{ProviderError, Result};
use crate::http::{self, ClientOptions};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, info, instrument};

const API_BASE: &str = "https://api.music.apple.com";

pub struct AppleMusicApi {
    client: Client,
    token: String,
    api_base: String,
}

impl fmt::Debug for AppleMusicApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleMusicApi")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl AppleMusicApi {
    /// Creates a client authenticated with a developer token and checks the
    /// token against the storefront endpoint.
    pub async fn new(token: String, storefront: &str, options: &ClientOptions) -> Result<Self> {
        info!("Initializing Apple Music API client");
        if token.trim().is_empty() {
            return Err(ProviderError::MissingCredential("MIKU_APPLE_MUSIC_API_TOKEN"));
        }

        let api = Self {
            client: http::build_client(options)?,
            token,
            api_base: options.api_base_or(API_BASE),
        };

        let storefronts: StorefrontsResponse = api
            .get(&format!("/v1/storefronts/{}", storefront), &[], "Apple Music storefront")
            .await?;
        if storefronts.data.is_empty() {
            return Err(ProviderError::not_found(format!("unknown storefront {}", storefront)));
        }

        Ok(api)
    }

    /// Get a catalog song by ID
    #[instrument(skip(self), fields(service = "applemusic"))]
    pub async fn get_song(&self, storefront: &str, id: &str) -> Result<SongsResponse> {
        info!("Fetching song {} from storefront {}", id, storefront);
        self.get(
            &format!("/v1/catalog/{}/songs/{}", storefront, id),
            &[],
            "Apple Music song",
        )
        .await
    }

    /// Get catalog songs carrying `isrc`
    #[instrument(skip(self), fields(service = "applemusic"))]
    pub async fn get_songs_by_isrc(&self, storefront: &str, isrc: &str) -> Result<SongsResponse> {
        info!("Searching songs by ISRC {} in storefront {}", isrc, storefront);
        let songs: SongsResponse = self
            .get(
                &format!("/v1/catalog/{}/songs", storefront),
                &[("filter[isrc]", isrc)],
                "Apple Music ISRC search",
            )
            .await?;

        debug!("ISRC search returned {} songs", songs.data.len());
        Ok(songs)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], what: &str) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        http::read_json(response, what).await
    }
}
