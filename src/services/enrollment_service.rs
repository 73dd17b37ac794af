//! Event enrollment service

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ConflictReason},
    models::{Event, EventStatus, Participant, Principal, Team},
    services::{
        coordination::{with_retry, Compensation, Saga},
        membership_service::{load_event, MembershipService},
    },
    state::AppState,
};

/// Event enrollment service for business logic
pub struct EnrollmentService;

impl EnrollmentService {
    /// Enroll the principal in an upcoming event.
    ///
    /// Returns the participant's team; joining twice returns the same team.
    #[tracing::instrument(skip(state))]
    pub async fn join_event(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
    ) -> AppResult<Team> {
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "join_event",
            move || Self::try_join_event(state, principal.id, event_id),
        )
        .await
    }

    async fn try_join_event(state: &AppState, participant_id: Uuid, event_id: Uuid) -> AppResult<Team> {
        let event = load_event(state, event_id).await?;

        if event.is_participant(&participant_id) {
            debug!(%participant_id, %event_id, "Already enrolled");
            return Self::ensure_team(state, event, participant_id).await;
        }

        if state.status_of(&event) != EventStatus::Upcoming {
            return Err(AppError::Conflict(ConflictReason::EventStarted));
        }

        let mut saga = Saga::new("join_event", state.store());
        let (team, _) = Self::enroll(state, &mut saga, event, participant_id).await?;
        Ok(team)
    }

    /// Remove the principal from an event they have not started yet.
    ///
    /// The participant's team is dissolved if they were its only member.
    /// Unlike leaving a team, no replacement team is created.
    #[tracing::instrument(skip(state))]
    pub async fn leave_event(state: &AppState, principal: Principal, event_id: Uuid) -> AppResult<()> {
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "leave_event",
            move || Self::try_leave_event(state, principal.id, event_id),
        )
        .await
    }

    async fn try_leave_event(state: &AppState, participant_id: Uuid, event_id: Uuid) -> AppResult<()> {
        let store = state.store();
        let mut event = load_event(state, event_id).await?;

        if !event.is_participant(&participant_id) {
            debug!(%participant_id, %event_id, "Not enrolled, nothing to leave");
            return Ok(());
        }

        if state.status_of(&event) != EventStatus::Upcoming {
            return Err(AppError::Conflict(ConflictReason::EventStarted));
        }

        let team = store.team_for_member(event_id, participant_id).await?;
        if team.as_ref().is_some_and(|t| t.submitted_project) {
            return Err(AppError::Conflict(ConflictReason::SubmissionLocked));
        }

        let dissolve = team.as_ref().is_some_and(Team::is_solo);
        let orphaned = match team.as_ref().filter(|_| dissolve) {
            Some(team) => store.project_for_team(team.id).await?,
            None => None,
        };

        let mut saga = Saga::new("leave_event", store);

        let snapshot = event.clone();
        event.remove_participant(&participant_id);
        if let Some(team) = team.as_ref().filter(|_| dissolve) {
            event.remove_team(&team.id);
        }
        saga.step(store.update_event(&event)).await?;
        saga.record(Compensation::RestoreEventSets(Box::new(snapshot)));

        if let Some(mut team) = team {
            if dissolve {
                saga.step(store.delete_team(&team)).await?;
                saga.record(Compensation::RecreateTeam(Box::new(team)));

                // The draft goes with the only team that could ever edit it
                if let Some(project) = orphaned {
                    saga.step(store.delete_project(&project)).await?;
                    debug!(project_id = %project.id, "Deleted draft of dissolved team");
                    saga.record(Compensation::RecreateProject(Box::new(project)));
                }
            } else {
                let members = team.members.clone();
                team.remove_member(&participant_id);
                saga.step(store.update_team(&team)).await?;
                saga.record(Compensation::RestoreRoster {
                    team_id: team.id,
                    members,
                });
            }
        }

        if let Some(mut participant) = saga.step(store.participant(participant_id)).await? {
            if participant.leave(&event_id) {
                saga.step(store.save_participant(&participant)).await?;
            }
        }

        info!(%participant_id, %event_id, "Participant left event");
        Ok(())
    }

    /// Mark a participant present, enrolling them first if needed.
    ///
    /// Organizers may check people in whatever the event's status.
    #[tracing::instrument(skip(state))]
    pub async fn check_in(
        state: &AppState,
        organizer: Principal,
        event_id: Uuid,
        participant_id: Uuid,
    ) -> AppResult<Event> {
        if !organizer.role.can_organize() {
            return Err(AppError::Forbidden(
                "Only organizers can check participants in".to_string(),
            ));
        }

        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "check_in",
            move || Self::try_check_in(state, event_id, participant_id),
        )
        .await
    }

    async fn try_check_in(state: &AppState, event_id: Uuid, participant_id: Uuid) -> AppResult<Event> {
        let mut event = load_event(state, event_id).await?;
        let mut saga = Saga::new("check_in", state.store());

        if !event.is_participant(&participant_id) {
            let (_, enrolled) = Self::enroll(state, &mut saga, event, participant_id).await?;
            event = enrolled;
        }

        if event.is_checked_in(&participant_id) {
            debug!(%participant_id, %event_id, "Already checked in");
            return Ok(event);
        }

        event.check_in(participant_id);
        let event = saga.step(state.store().update_event(&event)).await?;
        info!(%participant_id, %event_id, "Participant checked in");
        Ok(event)
    }

    /// Give a new participant a solo team and record the enrollment on both
    /// the event and the participant.
    async fn enroll(
        state: &AppState,
        saga: &mut Saga<'_>,
        mut event: Event,
        participant_id: Uuid,
    ) -> AppResult<(Team, Event)> {
        let store = state.store();
        let snapshot = event.clone();

        let team = MembershipService::seat_solo(state, saga, &mut event, participant_id).await?;
        event.add_participant(participant_id);
        let event = saga.step(store.update_event(&event)).await?;
        saga.record(Compensation::RestoreEventSets(Box::new(snapshot)));

        let mut participant = saga
            .step(store.participant(participant_id))
            .await?
            .unwrap_or_else(|| Participant::new(participant_id));
        let joined_before = participant.events.clone();
        if participant.join(event.id) {
            saga.step(store.save_participant(&participant)).await?;
            saga.record(Compensation::RestoreParticipantEvents {
                participant_id,
                events: joined_before,
            });
        }

        info!(%participant_id, event_id = %event.id, team_id = %team.id, "Participant enrolled");
        Ok((team, event))
    }

    /// Return the enrolled participant's team, seating them in a solo team if
    /// they have none.
    async fn ensure_team(state: &AppState, mut event: Event, participant_id: Uuid) -> AppResult<Team> {
        if let Some(team) = state.store().team_for_member(event.id, participant_id).await? {
            return Ok(team);
        }

        let mut saga = Saga::new("join_event", state.store());
        let team = MembershipService::seat_solo(state, &mut saga, &mut event, participant_id).await?;
        saga.step(state.store().update_event(&event)).await?;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProject;
    use crate::services::ProjectService;
    use crate::test_utils::{engine, seed_event, Harness};

    #[tokio::test]
    async fn test_join_event_creates_solo_team() {
        let h = Harness::new();
        let event = h.event().await;

        let (p1, t1) = h.enroll(event.id).await;

        assert_eq!(t1.members, vec![p1.id]);
        assert!(!t1.join_code.is_empty());
        let event = h.reload_event(event.id).await;
        assert_eq!(event.participants, vec![p1.id]);
        assert_eq!(event.teams, vec![t1.id]);

        let participant = h.state.store().participant(p1.id).await.unwrap().unwrap();
        assert_eq!(participant.events, vec![event.id]);
    }

    #[tokio::test]
    async fn test_join_event_is_idempotent() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;

        let again = EnrollmentService::join_event(&h.state, p1, event.id).await.unwrap();
        assert_eq!(again.id, t1.id);
        assert_eq!(h.reload_event(event.id).await.teams.len(), 1);
    }

    #[tokio::test]
    async fn test_join_started_event_rejected() {
        let state = engine(EventStatus::Ongoing);
        let event = seed_event(&state).await;

        let err = EnrollmentService::join_event(&state, Principal::participant(Uuid::new_v4()), event.id)
            .await
            .unwrap_err();
        assert!(err.is_conflict(ConflictReason::EventStarted));
    }

    #[tokio::test]
    async fn test_join_unknown_event() {
        let state = engine(EventStatus::Upcoming);
        let err = EnrollmentService::join_event(&state, Principal::participant(Uuid::new_v4()), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_leave_event_dissolves_solo_team() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;
        EnrollmentService::check_in(&h.state, Principal::organizer(Uuid::new_v4()), event.id, p1.id)
            .await
            .unwrap();

        EnrollmentService::leave_event(&h.state, p1, event.id).await.unwrap();

        let event = h.reload_event(event.id).await;
        assert!(event.participants.is_empty());
        assert!(event.checked_in.is_empty());
        assert!(event.teams.is_empty());
        assert!(h.reload_team(t1.id).await.is_none());
        let participant = h.state.store().participant(p1.id).await.unwrap().unwrap();
        assert!(participant.events.is_empty());

        // Leaving again is a no-op.
        EnrollmentService::leave_event(&h.state, p1, event.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_leave_event_deletes_draft_of_dissolved_team() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;
        let project = ProjectService::create_draft(
            &h.state,
            p1,
            event.id,
            NewProject {
                name: "Abandoned".to_string(),
                ..NewProject::default()
            },
        )
        .await
        .unwrap();

        EnrollmentService::leave_event(&h.state, p1, event.id).await.unwrap();

        assert!(h.reload_team(t1.id).await.is_none());
        let err = ProjectService::get_project(&h.state, project.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.state.store().project_for_team(t1.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leave_event_keeps_shared_team() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;
        let (p2, _) = h.enroll(event.id).await;
        MembershipService::join_team(&h.state, p2, event.id, &t1.join_code)
            .await
            .unwrap();

        EnrollmentService::leave_event(&h.state, p2, event.id).await.unwrap();

        assert_eq!(h.reload_team(t1.id).await.unwrap().members, vec![p1.id]);
        // No replacement team for the leaver.
        assert!(MembershipService::team_for(&h.state, event.id, p2.id).await.is_err());
        assert_eq!(h.reload_event(event.id).await.teams, vec![t1.id]);
    }

    #[tokio::test]
    async fn test_leave_event_after_start_rejected() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;
        h.set_status(EventStatus::Ongoing);

        let err = EnrollmentService::leave_event(&h.state, p1, event.id).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::EventStarted));
        assert!(h.reload_event(event.id).await.is_participant(&p1.id));
    }

    #[tokio::test]
    async fn test_leave_event_with_submitted_project_rejected() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;
        let project = ProjectService::create_draft(
            &h.state,
            p1,
            event.id,
            NewProject {
                name: "Keeper".to_string(),
                code_url: Some("https://example.com/keeper".to_string()),
                screenshot_ref: Some("media/keeper.png".to_string()),
                video_ref: Some("media/keeper.mp4".to_string()),
                ..NewProject::default()
            },
        )
        .await
        .unwrap();
        ProjectService::submit(&h.state, p1, project.id).await.unwrap();

        let err = EnrollmentService::leave_event(&h.state, p1, event.id).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::SubmissionLocked));
    }

    #[tokio::test]
    async fn test_check_in_enrolls_walk_ins() {
        let h = Harness::new();
        let event = h.event().await;
        h.set_status(EventStatus::Ongoing);
        let organizer = Principal::organizer(Uuid::new_v4());
        let walk_in = Uuid::new_v4();

        let updated = EnrollmentService::check_in(&h.state, organizer, event.id, walk_in)
            .await
            .unwrap();
        assert!(updated.is_participant(&walk_in));
        assert!(updated.is_checked_in(&walk_in));
        assert_eq!(updated.teams.len(), 1);

        // Checking in twice changes nothing.
        let again = EnrollmentService::check_in(&h.state, organizer, event.id, walk_in)
            .await
            .unwrap();
        assert_eq!(again.checked_in, vec![walk_in]);
        assert_eq!(again.version, updated.version);
    }

    #[tokio::test]
    async fn test_check_in_requires_organizer() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;

        let err = EnrollmentService::check_in(&h.state, p1, event.id, p1.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_enrollment_invariants_hold() {
        let h = Harness::new();
        let event = h.event().await;
        let organizer = Principal::organizer(Uuid::new_v4());
        let mut people = Vec::new();
        for _ in 0..5 {
            people.push(h.enroll(event.id).await.0);
        }
        let t0 = MembershipService::team_for(&h.state, event.id, people[0].id).await.unwrap();
        MembershipService::join_team(&h.state, people[1], event.id, &t0.join_code).await.unwrap();
        MembershipService::leave_team(&h.state, people[1], event.id).await.unwrap();
        EnrollmentService::check_in(&h.state, organizer, event.id, people[2].id).await.unwrap();
        EnrollmentService::leave_event(&h.state, people[3], event.id).await.unwrap();

        let event = h.reload_event(event.id).await;
        assert!(event.checked_in.iter().all(|p| event.is_participant(p)));
        for team_id in &event.teams {
            assert_eq!(h.reload_team(*team_id).await.unwrap().event_id, event.id);
        }
        for participant in &event.participants {
            let teams = h.state.store().teams_for_event(event.id).await.unwrap();
            assert_eq!(teams.iter().filter(|t| t.has_member(participant)).count(), 1);
        }
    }
}
