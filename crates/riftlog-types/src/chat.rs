//! Chat message types parsed out of the game client's chat logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::LogFileMetadata;

/// A single message line from a chat log.
///
/// Equality and hashing are by value, so the same line read from two
/// different files (two characters listening to one channel) compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Time the message was sent (UTC, second precision)
    pub timestamp: DateTime<Utc>,
    /// Character name of the sender
    pub author: String,
    /// Message text
    pub message: String,
}

impl ChatMessage {
    pub fn new(timestamp: DateTime<Utc>, author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            author: author.into(),
            message: message.into(),
        }
    }

    /// Whether `other` carries the same author and text, ignoring the timestamp.
    pub fn same_content(&self, other: &ChatMessage) -> bool {
        self.author == other.author && self.message == other.message
    }
}

/// A chat message together with the channel it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelChatMessage {
    pub chat_message: ChatMessage,
    pub metadata: LogFileMetadata,
}

impl ChannelChatMessage {
    pub fn new(chat_message: ChatMessage, metadata: LogFileMetadata) -> Self {
        Self {
            chat_message,
            metadata,
        }
    }

    pub fn channel_name(&self) -> &str {
        &self.metadata.channel_name
    }
}
