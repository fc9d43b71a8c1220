use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;
use streaming_providers::{
    applemusic, tidal, AppleMusicProvider, ClientCredentials, ClientOptions, ProviderEmoji,
    ProviderInfo, Song, SpotifyProvider, StreamingProvider, TidalProvider, Url,
};
use tracing_subscriber::EnvFilter;

/// Streaming Provider Lookup
///
/// Resolve a link, or search a catalog by ISRC, against one live provider
/// and print the normalized song as JSON.
#[derive(Parser, Debug)]
#[command(name = "provider_lookup")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Provider to query
    #[arg(short, long, value_enum)]
    provider: Provider,

    /// Song link to resolve
    #[arg(conflicts_with = "isrc", required_unless_present = "isrc")]
    url: Option<String>,

    /// Search by ISRC instead of resolving a link
    #[arg(short, long)]
    isrc: Option<String>,

    #[arg(long, env = "MIKU_SPOTIFY_CLIENT_ID", hide_env_values = true, default_value = "")]
    spotify_client_id: String,

    #[arg(long, env = "MIKU_SPOTIFY_CLIENT_SECRET", hide_env_values = true, default_value = "")]
    spotify_client_secret: String,

    #[arg(long, env = "MIKU_APPLE_MUSIC_API_TOKEN", hide_env_values = true, default_value = "")]
    apple_music_token: String,

    #[arg(long, env = "MIKU_TIDAL_CLIENT_ID", hide_env_values = true, default_value = "")]
    tidal_client_id: String,

    #[arg(long, env = "MIKU_TIDAL_CLIENT_SECRET", hide_env_values = true, default_value = "")]
    tidal_client_secret: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Provider {
    Spotify,
    Applemusic,
    Tidal,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Use RUST_LOG to control verbosity, e.g. RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let options = ClientOptions::default().with_timeout(Duration::from_secs(args.timeout));

    let provider: Box<dyn StreamingProvider> = match args.provider {
        Provider::Spotify => Box::new(
            SpotifyProvider::new(
                ClientCredentials::new(&args.spotify_client_id, &args.spotify_client_secret),
                options,
            )
            .await
            .context("Failed to create Spotify provider")?,
        ),
        Provider::Applemusic => Box::new(
            AppleMusicProvider::new(
                args.apple_music_token.clone(),
                applemusic::DEFAULT_STOREFRONT,
                options,
            )
            .await
            .context("Failed to create Apple Music provider")?,
        ),
        Provider::Tidal => Box::new(
            TidalProvider::new(
                ClientCredentials::new(&args.tidal_client_id, &args.tidal_client_secret),
                tidal::DEFAULT_COUNTRY_CODE,
                options,
            )
            .await
            .context("Failed to create TIDAL provider")?,
        ),
    };

    let song = match (&args.url, &args.isrc) {
        (Some(url), _) => {
            let url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
            provider.lookup_song_by_url(&url).await?
        }
        (None, Some(isrc)) => provider.search(&isrc_probe(isrc)).await?,
        (None, None) => anyhow::bail!("Either a URL or --isrc is required"),
    };

    println!("{}", serde_json::to_string_pretty(&song)?);
    Ok(())
}

/// A bare song carrying only the ISRC, as if another provider had found it.
fn isrc_probe(isrc: &str) -> Song {
    Song {
        provider: ProviderInfo::new("cli", "Command line", ProviderEmoji::unicode("⌨️")),
        provider_url: String::new(),
        isrc: Some(isrc.to_string()),
        title: String::new(),
        artists: Vec::new(),
        album: String::new(),
        album_art_url: None,
        duration_secs: None,
    }
}
