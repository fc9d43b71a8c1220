//! Build the chat reply for a resolved song.
//!
//! The reply is transport-neutral: an embed describing the canonical song,
//! one link button per provider and, optionally, the text the poster wrote
//! around the link. The chat bridge turns it into whatever its platform
//! expects.

use serde::{Deserialize, Serialize};
use streaming_providers::{ProviderEmoji, Song};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    /// Id of the message being answered
    pub reply_to: Option<String>,
    pub embed: Embed,
    /// Alternatives first, canonical last
    pub buttons: Vec<LinkButton>,
    pub commentary: Option<Commentary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    /// Provider identifier
    pub provider: String,
    pub label: String,
    pub url: String,
    pub emoji: ProviderEmoji,
}

/// What the poster wrote besides the link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    pub author: String,
    pub text: String,
}

impl Commentary {
    /// The message text with `url` (and any `<...>` around it) removed and
    /// whitespace collapsed. Brackets left empty by the removal go too.
    ///
    /// `None` if nothing but the link was posted.
    pub fn from_message(author: &str, content: &str, url: &str) -> Option<Self> {
        let wrapped = format!("<{}>", url);
        let needle = if content.contains(&wrapped) { wrapped.as_str() } else { url };

        let text = collapse_whitespace(&content.replacen(needle, " ", 1))
            .replace("( ", "(")
            .replace(" )", ")")
            .replace("()", " ");
        let text = collapse_whitespace(&text);

        if text.is_empty() {
            return None;
        }

        Some(Self {
            author: author.to_string(),
            text,
        })
    }
}

impl ReplyPayload {
    /// `(provider identifier, url)` for every button, in display order
    pub fn link_targets(&self) -> Vec<(&str, &str)> {
        self.buttons
            .iter()
            .map(|button| (button.provider.as_str(), button.url.as_str()))
            .collect()
    }

    pub fn in_reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

pub struct MessageComposer;

impl MessageComposer {
    pub fn build<'a>(
        canonical: &'a Song,
        alternatives: impl IntoIterator<Item = &'a Song>,
        commentary: Option<Commentary>,
    ) -> ReplyPayload {
        let provider = &canonical.provider;

        let footer = match canonical.formatted_duration() {
            Some(duration) => format!("{} • {}", provider.display_name, duration),
            None => provider.display_name.clone(),
        };

        let embed = Embed {
            title: canonical.title.clone(),
            description: canonical.artists.join(", "),
            url: canonical.provider_url.clone(),
            thumbnail_url: canonical.album_art_url.clone(),
            footer,
        };

        let buttons = alternatives
            .into_iter()
            .chain(std::iter::once(canonical))
            .map(button)
            .collect();

        ReplyPayload {
            reply_to: None,
            embed,
            buttons,
            commentary,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn button(song: &Song) -> LinkButton {
    LinkButton {
        provider: song.provider.identifier.clone(),
        label: song.provider.display_name.clone(),
        url: song.provider_url.clone(),
        emoji: song.provider.emoji.clone(),
    }
}
