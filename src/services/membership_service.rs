//! Team membership service

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ConflictReason},
    models::{Event, Principal, Team},
    services::{
        coordination::{with_retry, Compensation, Saga},
        join_code::insert_solo_team,
    },
    state::AppState,
    utils::normalize_join_code,
};

/// Team membership service for business logic
pub struct MembershipService;

impl MembershipService {
    /// Create a one-member team for a participant and register it on the event
    #[tracing::instrument(skip(state))]
    pub async fn create_solo_team(
        state: &AppState,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> AppResult<Team> {
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "create_solo_team",
            move || async move {
                let mut event = load_event(state, event_id).await?;
                let mut saga = Saga::new("create_solo_team", state.store());
                let team = Self::seat_solo(state, &mut saga, &mut event, participant_id).await?;
                saga.step(state.store().update_event(&event)).await?;
                Ok(team)
            },
        )
        .await
    }

    /// Move the principal into the team with `join_code`
    #[tracing::instrument(skip(state))]
    pub async fn join_team(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
        join_code: &str,
    ) -> AppResult<Team> {
        let code = normalize_join_code(join_code).map_err(|_| AppError::not_found("Team"))?;
        let code = code.as_str();

        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "join_team",
            move || Self::try_join_team(state, principal, event_id, code),
        )
        .await
    }

    async fn try_join_team(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
        code: &str,
    ) -> AppResult<Team> {
        let store = state.store();
        let mut event = load_event(state, event_id).await?;

        let mut target = store
            .team_by_join_code(code)
            .await?
            .filter(|team| team.event_id == event_id)
            .ok_or_else(|| AppError::not_found("Team"))?;

        if !event.is_participant(&principal.id) {
            return Err(AppError::Forbidden(
                "Join the event before joining a team".to_string(),
            ));
        }

        if target.has_member(&principal.id) {
            debug!(team_id = %target.id, "Already a member");
            return Ok(target);
        }

        if target.is_full(state.config().max_team_size) {
            return Err(AppError::Conflict(ConflictReason::TeamFull));
        }

        let current = store.team_for_member(event_id, principal.id).await?;
        if target.submitted_project || current.as_ref().is_some_and(|t| t.submitted_project) {
            return Err(AppError::Conflict(ConflictReason::SubmissionLocked));
        }

        // A draft follows its owner out of a solo team that dissolves
        let carried = match current.as_ref().filter(|team| team.is_solo()) {
            Some(old) => store.project_for_team(old.id).await?,
            None => None,
        };
        if carried.is_some() && store.project_for_team(target.id).await?.is_some() {
            return Err(AppError::Conflict(ConflictReason::TeamHasProject));
        }

        let mut saga = Saga::new("join_team", store);

        // New membership first
        let previous_members = target.members.clone();
        let previous_link = target.project_id;
        target.add_member(principal.id);
        if let Some(project) = &carried {
            target.project_id = Some(project.id);
        }
        let target = saga.step(store.update_team(&target)).await?;
        saga.record(Compensation::RestoreRoster {
            team_id: target.id,
            members: previous_members,
        });
        if carried.is_some() {
            saga.record(Compensation::RestoreProjectLink {
                team_id: target.id,
                project_id: previous_link,
            });
        }

        // Then the old one
        if let Some(mut old) = current {
            if old.is_solo() {
                let snapshot = event.clone();
                event.remove_team(&old.id);
                event = saga.step(store.update_event(&event)).await?;
                saga.record(Compensation::RestoreEventSets(Box::new(snapshot)));

                if let Some(mut project) = carried {
                    let previous_team = project.team_id;
                    project.team_id = target.id;
                    saga.step(store.update_project(&project)).await?;
                    saga.record(Compensation::RestoreProjectTeam {
                        project_id: project.id,
                        team_id: previous_team,
                    });
                    info!(project_id = %project.id, team_id = %target.id, "Moved draft to joined team");
                }

                saga.step(store.delete_team(&old)).await?;
                info!(team_id = %old.id, "Dissolved empty team");
            } else {
                old.remove_member(&principal.id);
                saga.step(store.update_team(&old)).await?;
            }
        }

        info!(
            participant_id = %principal.id,
            team_id = %target.id,
            event_id = %event.id,
            "Participant joined team"
        );
        Ok(target)
    }

    /// Leave the current team for a solo one.
    ///
    /// A participant who is already alone keeps their team.
    #[tracing::instrument(skip(state))]
    pub async fn leave_team(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
    ) -> AppResult<Team> {
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "leave_team",
            move || Self::try_leave_team(state, principal, event_id),
        )
        .await
    }

    async fn try_leave_team(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
    ) -> AppResult<Team> {
        let store = state.store();
        let mut event = load_event(state, event_id).await?;

        if !event.is_participant(&principal.id) {
            return Err(AppError::Forbidden(
                "Not a participant of this event".to_string(),
            ));
        }

        let current = store.team_for_member(event_id, principal.id).await?;
        if let Some(team) = &current {
            if team.submitted_project {
                return Err(AppError::Conflict(ConflictReason::SubmissionLocked));
            }
            if team.is_solo() {
                debug!(team_id = %team.id, "Already alone, nothing to leave");
                return Ok(team.clone());
            }
        }

        let mut saga = Saga::new("leave_team", store);
        let snapshot = event.clone();
        let solo = Self::seat_solo(state, &mut saga, &mut event, principal.id).await?;
        saga.step(store.update_event(&event)).await?;
        saga.record(Compensation::RestoreEventSets(Box::new(snapshot)));

        if let Some(mut old) = current {
            old.remove_member(&principal.id);
            saga.step(store.update_team(&old)).await?;
            info!(
                participant_id = %principal.id,
                old_team_id = %old.id,
                team_id = %solo.id,
                "Participant left team"
            );
        } else {
            info!(participant_id = %principal.id, team_id = %solo.id, "Re-seated participant without a team");
        }

        Ok(solo)
    }

    /// Team the participant currently holds in an event
    pub async fn team_for(state: &AppState, event_id: Uuid, participant_id: Uuid) -> AppResult<Team> {
        state
            .store()
            .team_for_member(event_id, participant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team"))
    }

    /// Members of a team, in join order
    pub async fn roster(state: &AppState, team_id: Uuid) -> AppResult<Vec<Uuid>> {
        let team = state
            .store()
            .team(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team"))?;
        Ok(team.members)
    }

    /// Insert a solo team and add it to `event` in memory.
    ///
    /// The caller writes the event; the inserted team is removed again if a
    /// later step of the saga fails.
    pub(crate) async fn seat_solo(
        state: &AppState,
        saga: &mut Saga<'_>,
        event: &mut Event,
        participant_id: Uuid,
    ) -> AppResult<Team> {
        let team = match insert_solo_team(state, event.id, participant_id).await {
            Ok(team) => team,
            Err(e) => return Err(saga.abort(e).await),
        };
        saga.record(Compensation::DeleteTeam(team.id));
        event.add_team(team.id);
        debug!(team_id = %team.id, join_code = %team.join_code, "Created solo team");
        Ok(team)
    }
}

pub(crate) async fn load_event(state: &AppState, event_id: Uuid) -> AppResult<Event> {
    state
        .store()
        .event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))
}
