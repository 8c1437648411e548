//! Conversation messages.

use std::time::{SystemTime, UNIX_EPOCH};

use recall_agent_model::ChatMessage;
use serde::{Deserialize, Serialize};

pub use recall_agent_model::ChatRole as Role;

/// A message in the conversation.
///
/// Messages are immutable once created, they are only appended to or
/// evicted from the memory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: u64,
}

impl Message {
    /// Creates a message.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S, timestamp: u64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text content.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the timestamp in milliseconds.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Converts to the form sent to the model, the timestamp is dropped.
    #[inline]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Hands out strictly increasing timestamps.
///
/// Timestamps follow the wall clock in milliseconds, but two messages
/// created within the same millisecond (or after the clock went backwards)
/// still get distinct, ordered values.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    last: u64,
}

impl Clock {
    /// Returns the next timestamp.
    pub fn now(&mut self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last = wall.max(self.last + 1);
        self.last
    }
}
