//! Redis list hand-off to the external mail worker.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};

use super::{Notification, Notifier, NotifyError};
use crate::config::RedisConfig;

/// Pushes each notification as JSON onto a Redis list
#[derive(Clone)]
pub struct RedisNotifier {
    redis: ConnectionManager,
    queue: String,
}

impl RedisNotifier {
    pub fn new(redis: ConnectionManager, queue: impl Into<String>) -> Self {
        Self {
            redis,
            queue: queue.into(),
        }
    }

    /// Connect using the application's Redis settings
    pub async fn connect(config: &RedisConfig) -> Result<Self, redis::RedisError> {
        let client = RedisClient::open(config.url.as_str())?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self::new(redis, config.notification_queue.clone()))
    }

    /// Name of the list the mail worker consumes
    pub fn queue(&self) -> &str {
        &self.queue
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&notification)?;
        let mut redis = self.redis.clone();
        redis.lpush::<_, _, ()>(&self.queue, payload).await?;

        tracing::debug!(
            participant_id = %notification.participant_id,
            kind = %notification.kind,
            queue = %self.queue,
            "Notification queued"
        );
        Ok(())
    }
}
