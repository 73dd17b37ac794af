//! Project submission service
//!
//! A project is created as a draft by a team member, edited while it is a
//! draft, and submitted once. Submission stamps the project, freezes the
//! owning team's roster and appends the project to the event's submission
//! order, in that order. If those three writes are interrupted, the next
//! `submit` call finishes the remaining ones.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, ConflictReason},
    models::{Event, NewProject, Principal, Project, ProjectPatch, Team},
    services::{
        coordination::{with_retry, Compensation, Saga},
        membership_service::load_event,
    },
    state::AppState,
};

/// Project service for business logic
pub struct ProjectService;

impl ProjectService {
    /// Start the project of the principal's team
    #[tracing::instrument(skip(state, draft), fields(name = %draft.name))]
    pub async fn create_draft(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
        draft: NewProject,
    ) -> AppResult<Project> {
        draft.validate()?;
        let draft = &draft;

        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "create_draft",
            move || Self::try_create_draft(state, principal, event_id, draft),
        )
        .await
    }

    async fn try_create_draft(
        state: &AppState,
        principal: Principal,
        event_id: Uuid,
        draft: &NewProject,
    ) -> AppResult<Project> {
        let store = state.store();
        load_event(state, event_id).await?;

        let mut team = store
            .team_for_member(event_id, principal.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("You are not on a team in this event".to_string()))?;

        if store.project_for_team(team.id).await?.is_some() {
            return Err(AppError::Forbidden("Team already has a project".to_string()));
        }

        let project = Project::draft(event_id, team.id, draft.clone());
        let mut saga = Saga::new("create_draft", store);

        // A link left dangling by an interrupted create is overwritten here.
        let previous_link = team.project_id.replace(project.id);
        saga.step(store.update_team(&team)).await?;
        saga.record(Compensation::RestoreProjectLink {
            team_id: team.id,
            project_id: previous_link,
        });

        let project = saga.step(store.insert_project(&project)).await?;

        info!(
            project_id = %project.id,
            team_id = %team.id,
            event_id = %event_id,
            "Project draft created"
        );
        Ok(project)
    }

    /// Edit a draft
    #[tracing::instrument(skip(state, patch))]
    pub async fn update_draft(
        state: &AppState,
        principal: Principal,
        project_id: Uuid,
        patch: ProjectPatch,
    ) -> AppResult<Project> {
        patch.validate()?;
        let patch = &patch;

        let event_id = load_project(state, project_id).await?.event_id;
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "update_draft",
            move || async move {
                let mut project = load_project(state, project_id).await?;
                Self::owning_team(state, &project, principal).await?;

                if project.is_submitted() {
                    return Err(AppError::Conflict(ConflictReason::LockedAfterSubmission));
                }

                project.apply(patch.clone());
                let project = state.store().update_project(&project).await?;
                debug!(project_id = %project.id, "Project draft updated");
                Ok(project)
            },
        )
        .await
    }

    /// Submit a complete draft for judging
    #[tracing::instrument(skip(state))]
    pub async fn submit(state: &AppState, principal: Principal, project_id: Uuid) -> AppResult<Project> {
        let event_id = load_project(state, project_id).await?.event_id;
        let _guard = state.lock_event(event_id).await;
        with_retry(
            state.config().storage_retry_attempts,
            "submit",
            move || Self::try_submit(state, principal, project_id),
        )
        .await
    }

    async fn try_submit(state: &AppState, principal: Principal, project_id: Uuid) -> AppResult<Project> {
        let mut project = load_project(state, project_id).await?;
        let team = Self::owning_team(state, &project, principal).await?;
        let event = load_event(state, project.event_id).await?;

        if project.is_submitted() {
            if is_propagated(&project, &team, &event) {
                return Err(AppError::Conflict(ConflictReason::AlreadySubmitted));
            }
            warn!(project_id = %project.id, "Completing interrupted submission");
            Self::propagate(state, &project, team, event).await?;
            return Ok(project);
        }

        let missing = project.missing_for_submission();
        if !missing.is_empty() {
            return Err(AppError::IncompleteSubmission { missing });
        }

        project.submitted_at = Some(Utc::now());
        project.submitted_by = Some(principal.id);
        let project = state.store().update_project(&project).await?;

        Self::propagate(state, &project, team, event).await?;

        info!(
            project_id = %project.id,
            team_id = %project.team_id,
            event_id = %project.event_id,
            submitted_by = %principal.id,
            "Project submitted"
        );
        Ok(project)
    }

    /// Freeze the team and record the submission on the event.
    ///
    /// Only moves forward: a failure leaves the project submitted and the
    /// next call picks up from here.
    async fn propagate(state: &AppState, project: &Project, mut team: Team, mut event: Event) -> AppResult<()> {
        let store = state.store();

        if !team.submitted_project || team.project_id != Some(project.id) {
            team.submitted_project = true;
            team.project_id = Some(project.id);
            store.update_team(&team).await?;
        }

        if event.add_project(project.id) {
            store.update_event(&event).await?;
        }
        Ok(())
    }

    /// Get a project by ID
    pub async fn get_project(state: &AppState, project_id: Uuid) -> AppResult<Project> {
        load_project(state, project_id).await
    }

    /// The project's team, if the principal is on it
    async fn owning_team(state: &AppState, project: &Project, principal: Principal) -> AppResult<Team> {
        state
            .store()
            .team(project.team_id)
            .await?
            .filter(|team| team.has_member(&principal.id))
            .ok_or_else(|| AppError::Forbidden("Only the owning team can change this project".to_string()))
    }
}

fn is_propagated(project: &Project, team: &Team, event: &Event) -> bool {
    team.submitted_project && team.project_id == Some(project.id) && event.projects.contains(&project.id)
}

pub(crate) async fn load_project(state: &AppState, project_id: Uuid) -> AppResult<Project> {
    state
        .store()
        .project(project_id)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use crate::test_utils::Harness;

    fn complete_draft(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            description: Some("Built over a weekend".to_string()),
            code_url: Some("https://example.com/code".to_string()),
            screenshot_ref: Some("media/shot.png".to_string()),
            video_ref: Some("media/demo.mp4".to_string()),
            demo_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_draft_links_team() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;

        let project = ProjectService::create_draft(&h.state, p1, event.id, complete_draft("Linked"))
            .await
            .unwrap();

        assert_eq!(project.status(), ProjectStatus::Draft);
        assert_eq!(project.team_id, t1.id);
        assert_eq!(h.reload_team(t1.id).await.unwrap().project_id, Some(project.id));
    }

    #[tokio::test]
    async fn test_create_draft_rules() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;

        // Not on a team in this event
        let outsider = Principal::participant(Uuid::new_v4());
        let err = ProjectService::create_draft(&h.state, outsider, event.id, complete_draft("Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Invalid fields
        let mut bad = complete_draft("Bad url");
        bad.code_url = Some("not a url".to_string());
        let err = ProjectService::create_draft(&h.state, p1, event.id, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // One project per team
        ProjectService::create_draft(&h.state, p1, event.id, complete_draft("First"))
            .await
            .unwrap();
        let err = ProjectService::create_draft(&h.state, p1, event.id, complete_draft("Second"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_incomplete_submission_rejected() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;
        let mut draft = complete_draft("Half done");
        draft.screenshot_ref = None;
        let project = ProjectService::create_draft(&h.state, p1, event.id, draft).await.unwrap();

        let err = ProjectService::submit(&h.state, p1, project.id).await.unwrap_err();

        match err {
            AppError::IncompleteSubmission { missing } => assert_eq!(missing, vec!["screenshot"]),
            other => panic!("unexpected error: {other:?}"),
        }
        let stored = ProjectService::get_project(&h.state, project.id).await.unwrap();
        assert!(stored.submitted_at.is_none());
    }

    #[tokio::test]
    async fn test_submit_freezes_team_and_records_order() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;
        let (p2, t2) = h.enroll(event.id).await;

        let second = ProjectService::create_draft(&h.state, p2, event.id, complete_draft("B"))
            .await
            .unwrap();
        let first = ProjectService::create_draft(&h.state, p1, event.id, complete_draft("A"))
            .await
            .unwrap();
        ProjectService::submit(&h.state, p2, second.id).await.unwrap();
        let submitted = ProjectService::submit(&h.state, p1, first.id).await.unwrap();

        assert_eq!(submitted.status(), ProjectStatus::Submitted);
        assert_eq!(submitted.submitted_by, Some(p1.id));
        assert!(h.reload_team(t1.id).await.unwrap().submitted_project);
        assert!(h.reload_team(t2.id).await.unwrap().submitted_project);
        assert_eq!(h.reload_event(event.id).await.projects, vec![second.id, first.id]);

        let err = ProjectService::submit(&h.state, p1, first.id).await.unwrap_err();
        assert!(err.is_conflict(ConflictReason::AlreadySubmitted));

        let err = ProjectService::update_draft(
            &h.state,
            p1,
            first.id,
            ProjectPatch {
                name: Some("Renamed".to_string()),
                ..ProjectPatch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_conflict(ConflictReason::LockedAfterSubmission));
    }

    #[tokio::test]
    async fn test_only_team_members_touch_project() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, _) = h.enroll(event.id).await;
        let (p2, _) = h.enroll(event.id).await;
        let project = ProjectService::create_draft(&h.state, p1, event.id, complete_draft("Mine"))
            .await
            .unwrap();

        let err = ProjectService::submit(&h.state, p2, project.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = ProjectService::update_draft(&h.state, p2, project.id, ProjectPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = ProjectService::update_draft(
            &h.state,
            p1,
            project.id,
            ProjectPatch {
                demo_url: Some("https://example.com/demo".to_string()),
                ..ProjectPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.demo_url.as_deref(), Some("https://example.com/demo"));
        assert_eq!(updated.name, "Mine");
    }

    #[tokio::test]
    async fn test_interrupted_submission_is_completed() {
        let h = Harness::new();
        let event = h.event().await;
        let (p1, t1) = h.enroll(event.id).await;
        let project = ProjectService::create_draft(&h.state, p1, event.id, complete_draft("Stamped"))
            .await
            .unwrap();

        // Simulate a crash after the project was stamped.
        let mut stamped = project.clone();
        stamped.submitted_at = Some(Utc::now());
        stamped.submitted_by = Some(p1.id);
        h.state.store().update_project(&stamped).await.unwrap();

        let finished = ProjectService::submit(&h.state, p1, project.id).await.unwrap();
        assert!(finished.is_submitted());
        assert!(h.reload_team(t1.id).await.unwrap().submitted_project);
        assert_eq!(h.reload_event(event.id).await.projects, vec![project.id]);
    }

    #[tokio::test]
    async fn test_get_unknown_project() {
        let h = Harness::new();
        let err = ProjectService::get_project(&h.state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
