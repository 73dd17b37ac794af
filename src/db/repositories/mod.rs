//! Database repositories
//!
//! Repositories handle all direct PostgreSQL interactions. Updates are
//! version-checked; a missing row on `UPDATE ... WHERE version = $n` means a
//! concurrent writer got there first.

pub mod event_repo;
pub mod feedback_repo;
pub mod participant_repo;
pub mod project_repo;
pub mod team_repo;

pub use event_repo::EventRepository;
pub use feedback_repo::FeedbackRepository;
pub use participant_repo::ParticipantRepository;
pub use project_repo::ProjectRepository;
pub use team_repo::TeamRepository;

use super::store::{StoreError, UniqueKey};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let key = match db_err.constraint() {
                    Some("teams_join_code_key") => Some(UniqueKey::TeamJoinCode),
                    Some("projects_team_id_key") => Some(UniqueKey::ProjectTeam),
                    Some("events_pkey") => Some(UniqueKey::EventId),
                    Some("participants_pkey") => Some(UniqueKey::ParticipantId),
                    _ => None,
                };
                if let Some(key) = key {
                    return StoreError::Duplicate(key);
                }
            }
        }
        StoreError::Backend(err.to_string())
    }
}
