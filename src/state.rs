//! Engine state management
//!
//! This module contains the shared state every service operation receives:
//! the document store, the notification hand-off, the event status source,
//! engine tunables and the per-event locks.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::Store;
use crate::models::{Event, EventStatus, StatusClassifier};
use crate::notify::Notifier;
use crate::services::coordination::KeyedLocks;

/// Shared engine state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Document store
    store: Arc<dyn Store>,

    /// Receiver of post-release notifications
    notifier: Arc<dyn Notifier>,

    /// External source of event status
    classifier: Arc<dyn StatusClassifier>,

    /// Engine configuration
    config: EngineConfig,

    /// Serializes mutations within one event
    event_locks: KeyedLocks<Uuid>,
}

impl AppState {
    /// Create a new engine state
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        classifier: Arc<dyn StatusClassifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                notifier,
                classifier,
                config,
                event_locks: KeyedLocks::new(),
            }),
        }
    }

    /// Get a reference to the document store
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a handle to the notifier
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Current status of an event, as reported by the classifier
    pub fn status_of(&self, event: &Event) -> EventStatus {
        self.inner.classifier.classify(event)
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Wait for exclusive access to an event's rosters, sets and projects
    pub async fn lock_event(&self, event_id: Uuid) -> OwnedMutexGuard<()> {
        self.inner.event_locks.lock(event_id).await
    }
}
