//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of inbound messages from a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message event delivered by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the chat channel the message was posted in.
    pub channel_name: String,
    /// Author identifier (username or transport-native id).
    pub author: String,
    /// Whether the author is an automated account.
    pub author_is_bot: bool,
    pub content: String,
    pub received_at: DateTime<Utc>,
    /// Transport-specific routing data needed to reply (chat ids etc.).
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(
        channel_name: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_name: channel_name.into(),
            author: author.into(),
            author_is_bot: false,
            content: content.into(),
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Mark the author as an automated account.
    pub fn with_bot_author(mut self) -> Self {
        self.author_is_bot = true;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A reply to send back to the originating channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Chat transport: a source of message events and a sink for replies.
///
/// `start()` acquires the event subscription; `shutdown()` releases it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging (e.g. "cli").
    fn name(&self) -> &str;

    /// Subscribe to inbound message events.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Send a reply to the channel `msg` came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Check the transport is reachable.
    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Release the event subscription.
    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_defaults_to_human_author() {
        let msg = IncomingMessage::new("bot-training", "alice", "Hello");
        assert!(!msg.author_is_bot);
        assert_eq!(msg.channel_name, "bot-training");
        assert!(msg.metadata.is_null());
    }

    #[test]
    fn with_bot_author_sets_flag() {
        let msg = IncomingMessage::new("bot-training", "other-bot", "Hello").with_bot_author();
        assert!(msg.author_is_bot);
    }

    #[test]
    fn metadata_carries_reply_routing() {
        let msg = IncomingMessage::new("bot-training", "alice", "Hello")
            .with_metadata(serde_json::json!({"chat_id": "42"}));
        assert_eq!(msg.metadata["chat_id"], "42");
    }

    #[test]
    fn message_ids_are_unique() {
        let a = IncomingMessage::new("c", "u", "x");
        let b = IncomingMessage::new("c", "u", "x");
        assert_ne!(a.id, b.id);
    }
}
