use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::composer::{Commentary, MessageComposer, ReplyPayload};
use crate::links::extract_first_url;
use crate::resolver::{ResolveError, Resolver};

/// A chat message as delivered by the chat bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub channel_id: String,
    pub author: Author,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    /// Only messages posted here are answered. `None` answers everywhere.
    pub channel_id: Option<String>,
}

pub struct MessageHandler {
    resolver: Arc<Resolver>,
    config: HandlerConfig,
}

impl MessageHandler {
    pub fn new(resolver: Arc<Resolver>, config: HandlerConfig) -> Self {
        Self { resolver, config }
    }

    /// Build a reply for a chat message, or `None` if it shouldn't get one.
    pub async fn handle(&self, message: &InboundMessage) -> Option<ReplyPayload> {
        if message.author.bot {
            return None;
        }

        if let Some(channel_id) = &self.config.channel_id {
            if message.channel_id != *channel_id {
                return None;
            }
        }

        let url = extract_first_url(&message.content)?;
        debug!("Message {} from {} links {}", message.id, message.author.name, url);

        let resolution = match self.resolver.resolve(url).await {
            Ok(resolution) => resolution,
            Err(ResolveError::NoAlternativesFound { canonical }) => {
                info!(
                    "No alternatives for '{}' ({}), not replying",
                    canonical.title, canonical.provider_url
                );
                return None;
            }
            Err(e @ ResolveError::OriginNotFound { .. }) => {
                debug!("{}", e);
                return None;
            }
            Err(e) => {
                warn!("Could not resolve link in message {}: {}", message.id, e);
                return None;
            }
        };

        let commentary = Commentary::from_message(&message.author.name, &message.content, url);
        let reply = MessageComposer::build(&resolution.canonical, resolution.alternatives(), commentary)
            .in_reply_to(&message.id);

        info!(
            "Replying to message {} with {} links",
            message.id,
            reply.buttons.len()
        );
        match serde_json::to_string(&reply) {
            Ok(json) => debug!("Reply: {}", json),
            Err(e) => warn!("Failed to serialize reply for logging: {}", e),
        }

        Some(reply)
    }
}
