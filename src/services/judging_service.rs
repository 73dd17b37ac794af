//! Judging service

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::MAX_COMMENT_LENGTH,
    error::{AppError, AppResult, ConflictReason},
    models::{JudgeFeedback, Principal, Scores},
    services::{membership_service::load_event, project_service::load_project},
    state::AppState,
};

/// Judging service for business logic
pub struct JudgingService;

impl JudgingService {
    /// Record a judge's scores for a submitted project, replacing any earlier
    /// scores from the same judge
    #[tracing::instrument(skip(state, comment))]
    pub async fn submit_feedback(
        state: &AppState,
        judge: Principal,
        project_id: Uuid,
        scores: Scores,
        comment: String,
    ) -> AppResult<JudgeFeedback> {
        if !judge.role.can_judge() {
            return Err(AppError::Forbidden("Only judges can score projects".to_string()));
        }
        scores.validate()?;
        if comment.chars().count() as u64 > MAX_COMMENT_LENGTH {
            return Err(AppError::Validation(format!(
                "Comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }

        let event_id = load_project(state, project_id).await?.event_id;

        // Held so that release cannot slip in between the check and the write.
        let _guard = state.lock_event(event_id).await;

        let project = load_project(state, project_id).await?;
        if !project.is_submitted() {
            return Err(AppError::Conflict(ConflictReason::NotSubmitted));
        }
        let event = load_event(state, event_id).await?;
        if event.released_judging {
            return Err(AppError::Conflict(ConflictReason::JudgingReleased));
        }

        let feedback = JudgeFeedback::new(judge.id, project_id, scores, comment);
        let feedback = state.store().upsert_feedback(&feedback).await?;

        info!(
            judge_id = %judge.id,
            project_id = %project_id,
            total_score = feedback.total_score,
            "Feedback recorded"
        );
        Ok(feedback)
    }

    /// Mean total score across all judges; 0.0 without feedback
    pub async fn compute_average(state: &AppState, project_id: Uuid) -> AppResult<f64> {
        let feedback = state.store().feedback_for_project(project_id).await?;
        Ok(average_total(&feedback))
    }

    /// Every judge's feedback for a project
    pub async fn feedback_for_project(state: &AppState, project_id: Uuid) -> AppResult<Vec<JudgeFeedback>> {
        load_project(state, project_id).await?;
        Ok(state.store().feedback_for_project(project_id).await?)
    }
}

pub(crate) fn average_total(feedback: &[JudgeFeedback]) -> f64 {
    if feedback.is_empty() {
        return 0.0;
    }
    let sum: i64 = feedback.iter().map(|f| i64::from(f.total_score)).sum();
    sum as f64 / feedback.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, NewProject, Project};
    use crate::services::{ProjectService, ReleaseService};
    use crate::test_utils::Harness;

    async fn submitted_project(h: &Harness) -> Project {
        let event = h.event().await;
        let (owner, _) = h.enroll(event.id).await;
        let project = ProjectService::create_draft(
            &h.state,
            owner,
            event.id,
            NewProject {
                name: "Judged".to_string(),
                code_url: Some("https://example.com/judged".to_string()),
                screenshot_ref: Some("media/judged.png".to_string()),
                video_ref: Some("media/judged.mp4".to_string()),
                ..NewProject::default()
            },
        )
        .await
        .unwrap();
        ProjectService::submit(&h.state, owner, project.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_resubmitting_replaces_feedback() {
        let h = Harness::new();
        let project = submitted_project(&h).await;
        let judge = Principal::judge(Uuid::new_v4());

        let first = JudgingService::submit_feedback(&h.state, judge, project.id, Scores::new(8, 9, 7, 10), "Great".to_string())
            .await
            .unwrap();
        assert_eq!(first.total_score, 34);

        let second = JudgingService::submit_feedback(&h.state, judge, project.id, Scores::new(5, 5, 5, 5), String::new())
            .await
            .unwrap();
        assert_eq!(second.total_score, 20);

        let all = JudgingService::feedback_for_project(&h.state, project.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total_score, 20);
    }

    #[tokio::test]
    async fn test_compute_average() {
        let h = Harness::new();
        let project = submitted_project(&h).await;
        assert_eq!(JudgingService::compute_average(&h.state, project.id).await.unwrap(), 0.0);

        for scores in [Scores::new(10, 10, 10, 10), Scores::new(5, 5, 5, 0)] {
            JudgingService::submit_feedback(&h.state, Principal::judge(Uuid::new_v4()), project.id, scores, String::new())
                .await
                .unwrap();
        }
        assert_eq!(JudgingService::compute_average(&h.state, project.id).await.unwrap(), 27.5);
    }

    #[tokio::test]
    async fn test_feedback_rules() {
        let h = Harness::new();
        let project = submitted_project(&h).await;
        let judge = Principal::judge(Uuid::new_v4());

        let err = JudgingService::submit_feedback(
            &h.state,
            Principal::participant(Uuid::new_v4()),
            project.id,
            Scores::new(1, 1, 1, 1),
            String::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = JudgingService::submit_feedback(&h.state, judge, project.id, Scores::new(11, 1, 1, 1), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = JudgingService::submit_feedback(&h.state, judge, Uuid::new_v4(), Scores::new(1, 1, 1, 1), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let long = "x".repeat(MAX_COMMENT_LENGTH as usize + 1);
        let err = JudgingService::submit_feedback(&h.state, judge, project.id, Scores::new(1, 1, 1, 1), long)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_drafts_cannot_be_judged() {
        let h = Harness::new();
        let event = h.event().await;
        let (owner, _) = h.enroll(event.id).await;
        let draft = ProjectService::create_draft(
            &h.state,
            owner,
            event.id,
            NewProject {
                name: "Unfinished".to_string(),
                ..NewProject::default()
            },
        )
        .await
        .unwrap();

        let err = JudgingService::submit_feedback(&h.state, Principal::judge(Uuid::new_v4()), draft.id, Scores::new(1, 1, 1, 1), String::new())
            .await
            .unwrap_err();
        assert!(err.is_conflict(ConflictReason::NotSubmitted));
    }

    #[tokio::test]
    async fn test_no_feedback_after_release() {
        let h = Harness::new();
        let project = submitted_project(&h).await;
        h.set_status(EventStatus::Completed);
        ReleaseService::release_judging(&h.state, Principal::organizer(Uuid::new_v4()), project.event_id)
            .await
            .unwrap();

        let err = JudgingService::submit_feedback(&h.state, Principal::judge(Uuid::new_v4()), project.id, Scores::new(1, 1, 1, 1), String::new())
            .await
            .unwrap_err();
        assert!(err.is_conflict(ConflictReason::JudgingReleased));
    }
}
