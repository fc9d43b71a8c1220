use serde::{Deserialize, Serialize};

/// Chat emoji shown next to a provider's link.
///
/// `id` is set for custom (uploaded) emoji, `name` alone is a unicode emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEmoji {
    pub id: Option<String>,
    pub name: String,
}

impl ProviderEmoji {
    pub fn custom(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Static identity of a streaming provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Stable identifier used for equality and dedup (e.g. "spotify")
    pub identifier: String,
    /// Human readable name (e.g. "Apple Music")
    pub display_name: String,
    pub emoji: ProviderEmoji,
    /// Hostname this provider's links live on. `None` means the provider
    /// validates URLs itself.
    pub url_hostname: Option<String>,
}

impl ProviderInfo {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>, emoji: ProviderEmoji) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            emoji,
            url_hostname: None,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.url_hostname = Some(hostname.into().to_ascii_lowercase());
        self
    }

    /// True if `host` is the declared hostname or one of its subdomains.
    /// Providers without a declared hostname never match.
    pub fn matches_host(&self, host: &str) -> bool {
        let Some(declared) = &self.url_hostname else {
            return false;
        };
        let host = host.trim_end_matches('.').to_ascii_lowercase();

        host == *declared
            || host
                .strip_suffix(declared.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// A track as catalogued by one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Provider that returned this song
    pub provider: ProviderInfo,
    /// Public link to the song on the provider's website
    pub provider_url: String,
    /// International Standard Recording Code, the cross-catalog join key
    pub isrc: Option<String>,
    pub title: String,
    /// The first artist is the primary artist
    pub artists: Vec<String>,
    pub album: String,
    pub album_art_url: Option<String>,
    pub duration_secs: Option<u32>,
}

impl Song {
    /// Duration as `MM:SS`, if the provider reported one.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_secs
            .map(|secs| format!("{:02}:{:02}", secs / 60, secs % 60))
    }

    /// ISRCs are case-insensitive; catalogs disagree on casing.
    pub fn normalized_isrc(&self) -> Option<String> {
        self.isrc
            .as_deref()
            .map(str::trim)
            .filter(|isrc| !isrc.is_empty())
            .map(str::to_ascii_uppercase)
    }
}
