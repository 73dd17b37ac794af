//! Notifier that only logs; used when no queue is configured.

use async_trait::async_trait;

use super::{Notification, Notifier, NotifyError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            participant_id = %notification.participant_id,
            kind = %notification.kind,
            data = %notification.template_data,
            "Notification (log only)"
        );
        Ok(())
    }
}
