use crate::auth::{ClientCredentials, TokenSource};
use crate::error::{ProviderError, Result};
use crate::http::{self, ClientOptions};
use crate::tidal::models::*;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

const API_BASE: &str = "https://openapi.tidal.com";
const TOKEN_URL: &str = "https://auth.tidal.com/v1/oauth2/token";
const MEDIA_TYPE: &str = "application/vnd.tidal.v1+json";

pub struct TidalApi {
    client: Client,
    tokens: TokenSource,
    api_base: String,
}

impl TidalApi {
    /// Creates a client and fetches the first access token.
    pub async fn new(credentials: ClientCredentials, options: &ClientOptions) -> Result<Self> {
        info!("Initializing TIDAL API client");
        credentials.require("MIKU_TIDAL_CLIENT_ID", "MIKU_TIDAL_CLIENT_SECRET")?;

        let client = http::build_client(options)?;
        let tokens = TokenSource::new(
            client.clone(),
            options.token_url_or(TOKEN_URL),
            credentials,
            "tidal",
        );
        tokens.bearer().await?;

        Ok(Self {
            client,
            tokens,
            api_base: options.api_base_or(API_BASE),
        })
    }

    /// Get a resource by its ID
    #[instrument(skip(self), fields(service = "tidal"))]
    pub async fn get_by_id(&self, id: &str, country_code: &str) -> Result<Resource> {
        info!("Fetching track {}", id);
        let container: ResourceContainer = self
            .get(
                &format!("/tracks/{}", id),
                &[("countryCode", country_code)],
                "TIDAL track",
            )
            .await?;

        container
            .resource
            .ok_or_else(|| ProviderError::not_found(format!("TIDAL returned no resource for {}", id)))
    }

    /// Get the single track carrying `isrc`. Zero or several matches are
    /// both reported as not found.
    #[instrument(skip(self), fields(service = "tidal"))]
    pub async fn get_by_isrc(&self, isrc: &str, country_code: &str) -> Result<Resource> {
        info!("Searching tracks by ISRC {}", isrc);
        let list: List = self
            .get(
                "/tracks/byIsrc",
                &[("isrc", isrc), ("countryCode", country_code)],
                "TIDAL ISRC search",
            )
            .await?;

        let mut resources: Vec<Resource> = list.data.into_iter().filter_map(|c| c.resource).collect();
        debug!("ISRC search returned {} resources", resources.len());

        match resources.len() {
            0 => Err(ProviderError::not_found(format!("no TIDAL tracks with ISRC {}", isrc))),
            1 => Ok(resources.remove(0)),
            n => {
                warn!("{} TIDAL tracks share ISRC {}", n, isrc);
                Err(ProviderError::not_found(format!(
                    "{} TIDAL tracks share ISRC {}",
                    n, isrc
                )))
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], what: &str) -> Result<T> {
        let token = self.tokens.bearer().await?;
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, MEDIA_TYPE)
            .header(CONTENT_TYPE, MEDIA_TYPE)
            .query(query)
            .send()
            .await?;

        http::read_json(response, what).await
    }
}
