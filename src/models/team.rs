//! Team model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::collections::{insert_unique, remove_item};

/// Team database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    /// Unique across every team of every event
    pub join_code: String,
    /// Roster in join order
    pub members: Vec<Uuid>,
    pub event_id: Uuid,
    pub project_id: Option<Uuid>,
    /// Set once the team's project is submitted; the roster is frozen from then on
    pub submitted_project: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Build an unsaved single-member team
    pub fn solo(event_id: Uuid, participant_id: Uuid, join_code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            join_code,
            members: vec![participant_id],
            event_id,
            project_id: None,
            submitted_project: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_member(&self, participant_id: &Uuid) -> bool {
        self.members.contains(participant_id)
    }

    pub fn is_full(&self, max_size: usize) -> bool {
        self.members.len() >= max_size
    }

    pub fn is_solo(&self) -> bool {
        self.members.len() == 1
    }

    pub fn add_member(&mut self, participant_id: Uuid) -> bool {
        debug_assert!(!self.submitted_project, "roster is frozen after submission");
        insert_unique(&mut self.members, participant_id)
    }

    pub fn remove_member(&mut self, participant_id: &Uuid) -> bool {
        debug_assert!(!self.submitted_project, "roster is frozen after submission");
        remove_item(&mut self.members, participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_helpers() {
        let owner = Uuid::new_v4();
        let mut team = Team::solo(Uuid::new_v4(), owner, "ABC234".to_string());
        assert!(team.is_solo());
        assert!(team.has_member(&owner));

        let mate = Uuid::new_v4();
        assert!(team.add_member(mate));
        assert!(!team.add_member(mate));
        assert!(!team.is_full(4));
        assert!(team.is_full(2));

        assert!(team.remove_member(&owner));
        assert_eq!(team.members, vec![mate]);
    }
}
