pub mod applemusic;
mod auth;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;
pub mod spotify;
pub mod tidal;

use async_trait::async_trait;
use std::sync::Arc;
pub use applemusic::AppleMusicProvider;
pub use auth::ClientCredentials;
pub use error::{ProviderError, Result};
pub use http::ClientOptions;
pub use memory::StaticProvider;
pub use models::*;
pub use spotify::SpotifyProvider;
pub use tidal::TidalProvider;
pub use url::Url;

/// A streaming service catalog that can resolve its own links and find
/// recordings catalogued elsewhere.
///
/// Implementations hold an authenticated client and nothing else: no song
/// state is cached between calls, so one instance serves concurrent
/// requests.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Identity used for routing and display. No I/O.
    fn info(&self) -> &ProviderInfo;

    /// Look up the song a link points at.
    ///
    /// Links of the wrong host or shape fail with `ProviderError::NotFound`
    /// without touching the network.
    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song>;

    /// Find the same recording as `song` (provided by another provider) in
    /// this catalog, joined on ISRC.
    async fn search(&self, song: &Song) -> Result<Song>;
}

#[async_trait]
impl<T: StreamingProvider + ?Sized> StreamingProvider for Arc<T> {
    fn info(&self) -> &ProviderInfo {
        (**self).info()
    }

    async fn lookup_song_by_url(&self, url: &Url) -> Result<Song> {
        (**self).lookup_song_by_url(url).await
    }

    async fn search(&self, song: &Song) -> Result<Song> {
        (**self).search(song).await
    }
}
