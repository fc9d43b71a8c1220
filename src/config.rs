use clap::{Args, Parser, ValueEnum};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use streaming_providers::ClientOptions;

use crate::handler::HandlerConfig;
use crate::resolver::{FanOut, ResolverOptions};

#[derive(Parser, Debug, Clone)]
#[command(name = "miku")]
#[command(about = "Replies to music links with the same song on other streaming services", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address to bind the HTTP bridge to
    #[arg(long, env = "MIKU_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "MIKU_PORT", default_value = "3000")]
    pub port: u16,

    /// Only handle messages posted in this channel
    #[arg(long, env = "MIKU_DISCORD_CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Enabled providers. Order is the priority used to classify links.
    #[arg(
        long,
        env = "MIKU_PROVIDERS",
        value_enum,
        value_delimiter = ',',
        default_values = ["spotify", "applemusic", "tidal"]
    )]
    pub providers: Vec<ProviderKind>,

    #[command(flatten)]
    pub credentials: Credentials,

    /// Apple Music storefront searched for alternatives
    #[arg(long, env = "MIKU_APPLE_MUSIC_STOREFRONT", default_value = "us")]
    pub apple_music_storefront: String,

    /// TIDAL country code used for lookups and searches
    #[arg(long, env = "MIKU_TIDAL_COUNTRY_CODE", default_value = "US")]
    pub tidal_country_code: String,

    /// Deadline for every provider call, in seconds
    #[arg(long, env = "MIKU_REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Ask providers for alternatives one at a time instead of concurrently
    #[arg(long, env = "MIKU_SEQUENTIAL_SEARCH")]
    pub sequential_search: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Spotify,
    #[value(name = "applemusic", alias = "apple-music")]
    AppleMusic,
    Tidal,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Spotify => "Spotify",
            ProviderKind::AppleMusic => "Apple Music",
            ProviderKind::Tidal => "TIDAL",
        };
        f.write_str(name)
    }
}

/// Provider credentials. Blank values are rejected when the provider is
/// created, not here, so disabled providers need no credentials.
#[derive(Args, Clone, Default)]
pub struct Credentials {
    #[arg(long, env = "MIKU_SPOTIFY_CLIENT_ID", hide_env_values = true, default_value = "")]
    pub spotify_client_id: String,

    #[arg(long, env = "MIKU_SPOTIFY_CLIENT_SECRET", hide_env_values = true, default_value = "")]
    pub spotify_client_secret: String,

    #[arg(long, env = "MIKU_APPLE_MUSIC_API_TOKEN", hide_env_values = true, default_value = "")]
    pub apple_music_token: String,

    #[arg(long, env = "MIKU_TIDAL_CLIENT_ID", hide_env_values = true, default_value = "")]
    pub tidal_client_id: String,

    #[arg(long, env = "MIKU_TIDAL_CLIENT_SECRET", hide_env_values = true, default_value = "")]
    pub tidal_client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |value: &str| if value.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &set(&self.spotify_client_secret))
            .field("apple_music_token", &set(&self.apple_music_token))
            .field("tidal_client_id", &self.tidal_client_id)
            .field("tidal_client_secret", &set(&self.tidal_client_secret))
            .finish()
    }
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default().with_timeout(self.call_timeout())
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            call_timeout: self.call_timeout(),
            fan_out: if self.sequential_search {
                FanOut::Sequential
            } else {
                FanOut::Parallel
            },
        }
    }

    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            channel_id: self.channel_id.clone().filter(|id| !id.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("miku").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(
            config.providers,
            vec![ProviderKind::Spotify, ProviderKind::AppleMusic, ProviderKind::Tidal]
        );
        assert_eq!(config.listen_addr().port(), 3000);
        assert_eq!(config.resolver_options().fan_out, FanOut::Parallel);
        assert_eq!(config.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_provider_order_and_aliases() {
        let config = parse(&["--providers", "tidal,apple-music"]);
        assert_eq!(config.providers, vec![ProviderKind::Tidal, ProviderKind::AppleMusic]);

        assert!(Config::try_parse_from(["miku", "--providers", "deezer"]).is_err());
    }

    #[test]
    fn test_sequential_search_and_timeout() {
        let config = parse(&["--sequential-search", "--request-timeout-secs", "0"]);
        assert_eq!(config.resolver_options().fan_out, FanOut::Sequential);
        // zero would make every call time out immediately
        assert_eq!(config.call_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_blank_channel_means_all_channels() {
        assert_eq!(parse(&["--channel-id", " "]).handler_config().channel_id, None);
        assert_eq!(
            parse(&["--channel-id", "1170"]).handler_config().channel_id.as_deref(),
            Some("1170")
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let config = parse(&["--spotify-client-secret", "hunter2"]);
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
