//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{MAX_EVENT_NAME_LENGTH, MAX_PROJECT_DESCRIPTION_LENGTH};
use crate::utils::collections::{insert_unique, remove_item};

/// Event database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    /// Enrolled participants, in enrollment order
    pub participants: Vec<Uuid>,
    pub teams: Vec<Uuid>,
    /// Always a subset of `participants`
    pub checked_in: Vec<Uuid>,
    /// Submitted projects, in submission order
    pub projects: Vec<Uuid>,
    pub released_judging: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build a fresh, unsaved event
    pub fn new(
        name: String,
        description: Option<String>,
        location: Option<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        submission_deadline: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            location,
            start_date,
            end_date,
            submission_deadline,
            participants: Vec::new(),
            teams: Vec::new(),
            checked_in: Vec::new(),
            projects: Vec::new(),
            released_judging: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status of the event at a given instant
    pub fn status_at(&self, now: DateTime<Utc>) -> EventStatus {
        if now < self.start_date {
            EventStatus::Upcoming
        } else if now < self.end_date {
            EventStatus::Ongoing
        } else {
            EventStatus::Completed
        }
    }

    pub fn is_participant(&self, participant_id: &Uuid) -> bool {
        self.participants.contains(participant_id)
    }

    pub fn is_checked_in(&self, participant_id: &Uuid) -> bool {
        self.checked_in.contains(participant_id)
    }

    pub fn add_participant(&mut self, participant_id: Uuid) -> bool {
        insert_unique(&mut self.participants, participant_id)
    }

    /// Remove a participant, dropping their check-in as well
    pub fn remove_participant(&mut self, participant_id: &Uuid) -> bool {
        remove_item(&mut self.checked_in, participant_id);
        remove_item(&mut self.participants, participant_id)
    }

    /// Mark a participant present. The caller enrolls them first.
    pub fn check_in(&mut self, participant_id: Uuid) -> bool {
        debug_assert!(self.is_participant(&participant_id));
        insert_unique(&mut self.checked_in, participant_id)
    }

    pub fn add_team(&mut self, team_id: Uuid) -> bool {
        insert_unique(&mut self.teams, team_id)
    }

    pub fn remove_team(&mut self, team_id: &Uuid) -> bool {
        remove_item(&mut self.teams, team_id)
    }

    pub fn add_project(&mut self, project_id: Uuid) -> bool {
        insert_unique(&mut self.projects, project_id)
    }
}

/// Fields supplied when an organizer creates an event
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEvent {
    #[validate(length(min = 1, max = MAX_EVENT_NAME_LENGTH))]
    pub name: String,

    #[validate(length(max = MAX_PROJECT_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[validate(length(max = MAX_EVENT_NAME_LENGTH))]
    pub location: Option<String>,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
}

/// Event status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Ongoing => write!(f, "ongoing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Source of an event's status.
///
/// The engine never derives status itself; it asks the classifier it was
/// built with.
pub trait StatusClassifier: Send + Sync {
    fn classify(&self, event: &Event) -> EventStatus;
}

/// Classifies against the current wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl StatusClassifier for WallClock {
    fn classify(&self, event: &Event) -> EventStatus {
        event.status_at(Utc::now())
    }
}

/// Reports the same status for every event
#[derive(Debug, Clone, Copy)]
pub struct FixedStatus(pub EventStatus);

impl StatusClassifier for FixedStatus {
    fn classify(&self, _event: &Event) -> EventStatus {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_starting_in(hours: i64) -> Event {
        let start = Utc::now() + Duration::hours(hours);
        Event::new(
            "Spring Hack".to_string(),
            None,
            None,
            start,
            start + Duration::hours(48),
            start + Duration::hours(40),
        )
    }

    #[test]
    fn test_status_at() {
        let event = event_starting_in(1);
        let now = Utc::now();
        assert_eq!(event.status_at(now), EventStatus::Upcoming);
        assert_eq!(event.status_at(now + Duration::hours(2)), EventStatus::Ongoing);
        assert_eq!(event.status_at(now + Duration::hours(100)), EventStatus::Completed);
    }

    #[test]
    fn test_remove_participant_drops_check_in() {
        let mut event = event_starting_in(1);
        let p = Uuid::new_v4();
        assert!(event.add_participant(p));
        assert!(!event.add_participant(p));
        assert!(event.check_in(p));

        assert!(event.remove_participant(&p));
        assert!(!event.is_checked_in(&p));
        assert!(event.participants.is_empty());
    }
}
