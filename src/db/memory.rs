//! In-memory implementation of `Store`.
//!
//! All tables live behind a single `RwLock`, so every write is atomic with
//! respect to the others. Unique constraints and version checks behave like
//! the PostgreSQL schema. All state is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Store, StoreError, StoreResult, UniqueKey};
use crate::models::{Event, JudgeFeedback, Participant, Project, Team};

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    teams: HashMap<Uuid, Team>,
    /// join code -> team id
    join_codes: HashMap<String, Uuid>,
    projects: HashMap<Uuid, Project>,
    /// (judge id, project id) -> feedback
    feedback: HashMap<(Uuid, Uuid), JudgeFeedback>,
    participants: HashMap<Uuid, Participant>,
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Check the caller's version against the stored one and bump it
fn bump(stored_version: i64, incoming_version: i64, entity: &'static str, id: Uuid) -> StoreResult<i64> {
    if stored_version != incoming_version {
        return Err(StoreError::stale(entity, id));
    }
    Ok(stored_version + 1)
}

#[async_trait]
impl Store for MemoryStore {
    async fn event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: &Event) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::Duplicate(UniqueKey::EventId));
        }
        let mut stored = event.clone();
        stored.version = 1;
        tables.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_event(&self, event: &Event) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;
        let current = tables
            .events
            .get_mut(&event.id)
            .ok_or_else(|| StoreError::stale("event", event.id))?;
        let version = bump(current.version, event.version, "event", event.id)?;

        let mut stored = event.clone();
        stored.version = version;
        stored.updated_at = Utc::now();
        *current = stored.clone();
        Ok(stored)
    }

    async fn team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let tables = self.tables.read().await;
        Ok(tables.teams.get(&id).cloned())
    }

    async fn team_by_join_code(&self, join_code: &str) -> StoreResult<Option<Team>> {
        let tables = self.tables.read().await;
        Ok(tables
            .join_codes
            .get(join_code)
            .and_then(|id| tables.teams.get(id))
            .cloned())
    }

    async fn team_for_member(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> StoreResult<Option<Team>> {
        let tables = self.tables.read().await;
        Ok(tables
            .teams
            .values()
            .find(|team| team.event_id == event_id && team.has_member(&participant_id))
            .cloned())
    }

    async fn teams_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Team>> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables
            .teams
            .values()
            .filter(|team| team.event_id == event_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(teams)
    }

    async fn insert_team(&self, team: &Team) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        if tables.join_codes.contains_key(&team.join_code) {
            return Err(StoreError::Duplicate(UniqueKey::TeamJoinCode));
        }
        let mut stored = team.clone();
        stored.version = 1;
        tables.join_codes.insert(stored.join_code.clone(), stored.id);
        tables.teams.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_team(&self, team: &Team) -> StoreResult<Team> {
        let mut tables = self.tables.write().await;
        let current = tables
            .teams
            .get_mut(&team.id)
            .ok_or_else(|| StoreError::stale("team", team.id))?;
        let version = bump(current.version, team.version, "team", team.id)?;
        if current.join_code != team.join_code {
            return Err(StoreError::Backend("join codes are immutable".to_string()));
        }

        let mut stored = team.clone();
        stored.version = version;
        stored.updated_at = Utc::now();
        *current = stored.clone();
        Ok(stored)
    }

    async fn delete_team(&self, team: &Team) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = tables
            .teams
            .get(&team.id)
            .ok_or_else(|| StoreError::stale("team", team.id))?;
        bump(current.version, team.version, "team", team.id)?;

        let join_code = current.join_code.clone();
        tables.teams.remove(&team.id);
        tables.join_codes.remove(&join_code);
        Ok(())
    }

    async fn project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).cloned())
    }

    async fn project_for_team(&self, team_id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .find(|project| project.team_id == team_id)
            .cloned())
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        if tables.projects.values().any(|p| p.team_id == project.team_id) {
            return Err(StoreError::Duplicate(UniqueKey::ProjectTeam));
        }
        let mut stored = project.clone();
        stored.version = 1;
        tables.projects.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_project(&self, project: &Project) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        if tables
            .projects
            .values()
            .any(|p| p.team_id == project.team_id && p.id != project.id)
        {
            return Err(StoreError::Duplicate(UniqueKey::ProjectTeam));
        }
        let current = tables
            .projects
            .get_mut(&project.id)
            .ok_or_else(|| StoreError::stale("project", project.id))?;
        let version = bump(current.version, project.version, "project", project.id)?;

        let mut stored = project.clone();
        stored.version = version;
        stored.updated_at = Utc::now();
        *current = stored.clone();
        Ok(stored)
    }

    async fn delete_project(&self, project: &Project) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = tables
            .projects
            .get(&project.id)
            .ok_or_else(|| StoreError::stale("project", project.id))?;
        bump(current.version, project.version, "project", project.id)?;

        tables.projects.remove(&project.id);
        Ok(())
    }

    async fn upsert_feedback(&self, feedback: &JudgeFeedback) -> StoreResult<JudgeFeedback> {
        let mut tables = self.tables.write().await;
        let key = (feedback.judge_id, feedback.project_id);
        let stored = match tables.feedback.get(&key) {
            Some(existing) => JudgeFeedback {
                id: existing.id,
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..feedback.clone()
            },
            None => feedback.clone(),
        };
        tables.feedback.insert(key, stored.clone());
        Ok(stored)
    }

    async fn feedback_for_project(&self, project_id: Uuid) -> StoreResult<Vec<JudgeFeedback>> {
        let tables = self.tables.read().await;
        let mut feedback: Vec<JudgeFeedback> = tables
            .feedback
            .values()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect();
        feedback.sort_by_key(|f| f.created_at);
        Ok(feedback)
    }

    async fn participant(&self, id: Uuid) -> StoreResult<Option<Participant>> {
        let tables = self.tables.read().await;
        Ok(tables.participants.get(&id).cloned())
    }

    async fn save_participant(&self, participant: &Participant) -> StoreResult<Participant> {
        let mut tables = self.tables.write().await;
        let mut stored = participant.clone();
        stored.updated_at = Utc::now();

        match tables.participants.get(&participant.id) {
            None if participant.version == 0 => stored.version = 1,
            None => return Err(StoreError::stale("participant", participant.id)),
            Some(_) if participant.version == 0 => {
                return Err(StoreError::stale("participant", participant.id));
            }
            Some(current) => {
                stored.version = bump(current.version, participant.version, "participant", participant.id)?;
            }
        }

        tables.participants.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
