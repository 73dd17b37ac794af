//! Judge feedback repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::store::StoreResult, models::JudgeFeedback};

/// Repository for judge feedback database operations
pub struct FeedbackRepository;

impl FeedbackRepository {
    /// Insert feedback, replacing any existing record for the same judge and project
    pub async fn upsert(pool: &PgPool, feedback: &JudgeFeedback) -> StoreResult<JudgeFeedback> {
        let feedback = sqlx::query_as::<_, JudgeFeedback>(
            r#"
            INSERT INTO judge_feedback (
                id, judge_id, project_id, creativity, functionality, technicality,
                interface, total_score, comment, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (judge_id, project_id) DO UPDATE
            SET
                creativity = EXCLUDED.creativity,
                functionality = EXCLUDED.functionality,
                technicality = EXCLUDED.technicality,
                interface = EXCLUDED.interface,
                total_score = EXCLUDED.total_score,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(feedback.id)
        .bind(feedback.judge_id)
        .bind(feedback.project_id)
        .bind(feedback.creativity)
        .bind(feedback.functionality)
        .bind(feedback.technicality)
        .bind(feedback.interface)
        .bind(feedback.total_score)
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .bind(feedback.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(feedback)
    }

    /// List feedback for a project, oldest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: &Uuid,
    ) -> StoreResult<Vec<JudgeFeedback>> {
        let feedback = sqlx::query_as::<_, JudgeFeedback>(
            r#"SELECT * FROM judge_feedback WHERE project_id = $1 ORDER BY created_at"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(feedback)
    }
}
