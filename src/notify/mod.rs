//! Outbound notification hand-off
//!
//! The engine only decides *who* hears *what* after judging is released.
//! Delivery, templating, throttling and retries belong to the collaborator
//! behind [`Notifier`].

mod logging;
mod redis_queue;

pub use logging::LogNotifier;
pub use redis_queue::RedisNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::message_kinds;

/// Kind of message a participant receives after release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Member of a top-ranked team
    Winner,
    /// Member of any other ranked team
    Participant,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winner => message_kinds::WINNER,
            Self::Participant => message_kinds::PARTICIPANT,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message for one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub participant_id: Uuid,
    pub kind: MessageKind,
    pub template_data: serde_json::Value,
}

/// Notification delivery errors. These never fail an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("could not serialize notification: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for NotifyError {
    fn from(err: redis::RedisError) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Receiver of post-release notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}
