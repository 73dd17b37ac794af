//! PostgreSQL implementation of `Store`, backed by the repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repositories::{
    EventRepository, FeedbackRepository, ParticipantRepository, ProjectRepository, TeamRepository,
};
use super::store::{Store, StoreResult};
use crate::models::{Event, JudgeFeedback, Participant, Project, Team};

/// Document store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        EventRepository::find_by_id(&self.pool, &id).await
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<Event> {
        EventRepository::create(&self.pool, event).await
    }

    async fn update_event(&self, event: &Event) -> StoreResult<Event> {
        EventRepository::update(&self.pool, event).await
    }

    async fn team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        TeamRepository::find_by_id(&self.pool, &id).await
    }

    async fn team_by_join_code(&self, join_code: &str) -> StoreResult<Option<Team>> {
        TeamRepository::find_by_join_code(&self.pool, join_code).await
    }

    async fn team_for_member(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> StoreResult<Option<Team>> {
        TeamRepository::find_by_member(&self.pool, &event_id, &participant_id).await
    }

    async fn teams_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Team>> {
        TeamRepository::list_by_event(&self.pool, &event_id).await
    }

    async fn insert_team(&self, team: &Team) -> StoreResult<Team> {
        TeamRepository::create(&self.pool, team).await
    }

    async fn update_team(&self, team: &Team) -> StoreResult<Team> {
        TeamRepository::update(&self.pool, team).await
    }

    async fn delete_team(&self, team: &Team) -> StoreResult<()> {
        TeamRepository::delete(&self.pool, team).await
    }

    async fn project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        ProjectRepository::find_by_id(&self.pool, &id).await
    }

    async fn project_for_team(&self, team_id: Uuid) -> StoreResult<Option<Project>> {
        ProjectRepository::find_by_team(&self.pool, &team_id).await
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<Project> {
        ProjectRepository::create(&self.pool, project).await
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Project> {
        ProjectRepository::update(&self.pool, project).await
    }

    async fn delete_project(&self, project: &Project) -> StoreResult<()> {
        ProjectRepository::delete(&self.pool, project).await
    }

    async fn upsert_feedback(&self, feedback: &JudgeFeedback) -> StoreResult<JudgeFeedback> {
        FeedbackRepository::upsert(&self.pool, feedback).await
    }

    async fn feedback_for_project(&self, project_id: Uuid) -> StoreResult<Vec<JudgeFeedback>> {
        FeedbackRepository::list_by_project(&self.pool, &project_id).await
    }

    async fn participant(&self, id: Uuid) -> StoreResult<Option<Participant>> {
        ParticipantRepository::find_by_id(&self.pool, &id).await
    }

    async fn save_participant(&self, participant: &Participant) -> StoreResult<Participant> {
        if participant.version == 0 {
            ParticipantRepository::create(&self.pool, participant).await
        } else {
            ParticipantRepository::update(&self.pool, participant).await
        }
    }
}
