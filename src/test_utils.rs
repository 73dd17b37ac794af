//! Test utilities
//!
//! Engines here run over `MemoryStore` with a status the test controls and a
//! notifier that records what it was asked to send.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::MemoryStore;
use crate::models::{Event, EventStatus, FixedStatus, Principal, StatusClassifier, Team};
use crate::notify::{Notification, Notifier, NotifyError};
use crate::services::EnrollmentService;
use crate::state::AppState;

/// Notifier that keeps every notification in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Status classifier a test can move forward by hand
pub struct ManualStatus(RwLock<EventStatus>);

impl ManualStatus {
    pub fn set(&self, status: EventStatus) {
        *self.0.write().unwrap() = status;
    }
}

impl StatusClassifier for ManualStatus {
    fn classify(&self, _event: &Event) -> EventStatus {
        *self.0.read().unwrap()
    }
}

/// Engine whose events always report `status`
pub fn engine(status: EventStatus) -> AppState {
    engine_with_notifier(status, Arc::new(RecordingNotifier::default()))
}

pub fn engine_with_notifier(status: EventStatus, notifier: Arc<dyn Notifier>) -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        notifier,
        Arc::new(FixedStatus(status)),
        EngineConfig::default(),
    )
}

/// Engine plus handles on its status and notifications
pub struct Harness {
    pub state: AppState,
    pub status: Arc<ManualStatus>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Starts with every event upcoming
    pub fn new() -> Self {
        let status = Arc::new(ManualStatus(RwLock::new(EventStatus::Upcoming)));
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            notifier.clone(),
            status.clone(),
            EngineConfig::default(),
        );
        Self {
            state,
            status,
            notifier,
        }
    }

    pub fn set_status(&self, status: EventStatus) {
        self.status.set(status);
    }

    /// Store a new event starting tomorrow
    pub async fn event(&self) -> Event {
        seed_event(&self.state).await
    }

    /// Enroll a fresh participant, returning them and their solo team
    pub async fn enroll(&self, event_id: Uuid) -> (Principal, Team) {
        let principal = Principal::participant(Uuid::new_v4());
        let team = EnrollmentService::join_event(&self.state, principal, event_id)
            .await
            .unwrap();
        (principal, team)
    }

    pub async fn reload_event(&self, event_id: Uuid) -> Event {
        self.state.store().event(event_id).await.unwrap().unwrap()
    }

    pub async fn reload_team(&self, team_id: Uuid) -> Option<Team> {
        self.state.store().team(team_id).await.unwrap()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Store a new event starting tomorrow
pub async fn seed_event(state: &AppState) -> Event {
    let start = Utc::now() + Duration::days(1);
    let event = Event::new(
        "Test Hack".to_string(),
        None,
        None,
        start,
        start + Duration::days(2),
        start + Duration::days(1),
    );
    state.store().insert_event(&event).await.unwrap()
}
