//! Storage contract for the lifecycle engine.
//!
//! The engine needs no multi-document transactions. It relies on:
//!
//! - point lookups and a handful of secondary lookups (join code, team by member);
//! - per-document compare-and-set: every `update_*` succeeds only if the stored
//!   `version` equals the version of the document passed in, and bumps it;
//! - unique join codes, one project per team, and one feedback record per
//!   (judge, project), enforced at write time.
//!
//! Unsaved documents carry `version == 0`; inserts store them with version 1.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, JudgeFeedback, Participant, Project, Team};

/// Unique constraint that rejected an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    EventId,
    TeamJoinCode,
    ProjectTeam,
    ParticipantId,
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EventId => "event id",
            Self::TeamJoinCode => "team join code",
            Self::ProjectTeam => "project for team",
            Self::ParticipantId => "participant id",
        };
        f.write_str(name)
    }
}

/// Storage-level failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Compare-and-set lost against a concurrent writer
    #[error("stale write to {entity} {id}")]
    StaleWrite { entity: &'static str, id: Uuid },

    #[error("duplicate {0}")]
    Duplicate(UniqueKey),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn stale(entity: &'static str, id: Uuid) -> Self {
        Self::StaleWrite { entity, id }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store used by every engine service
#[async_trait]
pub trait Store: Send + Sync {
    // Events

    async fn event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn insert_event(&self, event: &Event) -> StoreResult<Event>;

    /// Compare-and-set on `event.version`
    async fn update_event(&self, event: &Event) -> StoreResult<Event>;

    // Teams

    async fn team(&self, id: Uuid) -> StoreResult<Option<Team>>;

    async fn team_by_join_code(&self, join_code: &str) -> StoreResult<Option<Team>>;

    /// The team in `event_id` whose roster contains `participant_id`
    async fn team_for_member(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> StoreResult<Option<Team>>;

    async fn teams_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Team>>;

    /// Fails with `Duplicate(TeamJoinCode)` if the code is taken
    async fn insert_team(&self, team: &Team) -> StoreResult<Team>;

    /// Compare-and-set on `team.version`
    async fn update_team(&self, team: &Team) -> StoreResult<Team>;

    /// Compare-and-set delete on `team.version`
    async fn delete_team(&self, team: &Team) -> StoreResult<()>;

    // Projects

    async fn project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn project_for_team(&self, team_id: Uuid) -> StoreResult<Option<Project>>;

    /// Fails with `Duplicate(ProjectTeam)` if the team already owns a project
    async fn insert_project(&self, project: &Project) -> StoreResult<Project>;

    /// Compare-and-set on `project.version`.
    ///
    /// May move the project to another team; fails with `Duplicate(ProjectTeam)`
    /// if that team already owns one.
    async fn update_project(&self, project: &Project) -> StoreResult<Project>;

    /// Compare-and-set delete on `project.version`
    async fn delete_project(&self, project: &Project) -> StoreResult<()>;

    // Feedback

    /// Insert, or replace the record with the same (judge, project) pair
    async fn upsert_feedback(&self, feedback: &JudgeFeedback) -> StoreResult<JudgeFeedback>;

    async fn feedback_for_project(&self, project_id: Uuid) -> StoreResult<Vec<JudgeFeedback>>;

    // Participants

    async fn participant(&self, id: Uuid) -> StoreResult<Option<Participant>>;

    /// Insert when `version == 0`, compare-and-set otherwise
    async fn save_participant(&self, participant: &Participant) -> StoreResult<Participant>;
}
