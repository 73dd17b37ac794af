//! Participant and principal models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::constants::roles;
use crate::utils::collections::{insert_unique, remove_item};

/// Per-participant enrollment record.
///
/// The identity collaborator owns the participant itself; the engine only
/// keeps the set of events joined, which mirrors `Event::participants`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub events: Vec<Uuid>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// Unsaved record for a participant seen for the first time
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            events: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn join(&mut self, event_id: Uuid) -> bool {
        insert_unique(&mut self.events, event_id)
    }

    pub fn leave(&mut self, event_id: &Uuid) -> bool {
        remove_item(&mut self.events, event_id)
    }
}

/// Role of an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Participant,
    Organizer,
    Judge,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => roles::PARTICIPANT,
            Self::Organizer => roles::ORGANIZER,
            Self::Judge => roles::JUDGE,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            roles::PARTICIPANT => Some(Self::Participant),
            roles::ORGANIZER => Some(Self::Organizer),
            roles::JUDGE => Some(Self::Judge),
            _ => None,
        }
    }

    /// Check if this role can run events (check-in, release)
    pub fn can_organize(&self) -> bool {
        matches!(self, Self::Organizer)
    }

    /// Check if this role can score projects
    pub fn can_judge(&self) -> bool {
        matches!(self, Self::Judge)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller, as supplied by the session collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn participant(id: Uuid) -> Self {
        Self::new(id, Role::Participant)
    }

    pub fn organizer(id: Uuid) -> Self {
        Self::new(id, Role::Organizer)
    }

    pub fn judge(id: Uuid) -> Self {
        Self::new(id, Role::Judge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Participant, Role::Organizer, Role::Judge] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("admin"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(Role::Organizer.can_organize());
        assert!(!Role::Judge.can_organize());
        assert!(Role::Judge.can_judge());
        assert!(!Role::Participant.can_judge());
    }
}
