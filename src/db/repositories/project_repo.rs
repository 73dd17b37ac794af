//! Project repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::store::{StoreError, StoreResult},
    models::Project,
};

/// Repository for project database operations
pub struct ProjectRepository;

impl ProjectRepository {
    /// Insert a new draft; one project per team is enforced by the schema
    pub async fn create(pool: &PgPool, project: &Project) -> StoreResult<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                id, name, description, code_url, screenshot_ref, video_ref, demo_url,
                event_id, team_id, submitted_at, submitted_by, ranking,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1, $13, $14)
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.code_url)
        .bind(&project.screenshot_ref)
        .bind(&project.video_ref)
        .bind(&project.demo_url)
        .bind(project.event_id)
        .bind(project.team_id)
        .bind(project.submitted_at)
        .bind(project.submitted_by)
        .bind(project.ranking)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Find project by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(r#"SELECT * FROM projects WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    /// Find the project owned by a team
    pub async fn find_by_team(pool: &PgPool, team_id: &Uuid) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(r#"SELECT * FROM projects WHERE team_id = $1"#)
            .bind(team_id)
            .fetch_optional(pool)
            .await?;

        Ok(project)
    }

    /// Write all mutable fields if `version` still matches
    pub async fn update(pool: &PgPool, project: &Project) -> StoreResult<Project> {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                name = $3,
                description = $4,
                code_url = $5,
                screenshot_ref = $6,
                video_ref = $7,
                demo_url = $8,
                submitted_at = $9,
                submitted_by = $10,
                ranking = $11,
                team_id = $12,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(project.version)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.code_url)
        .bind(&project.screenshot_ref)
        .bind(&project.video_ref)
        .bind(&project.demo_url)
        .bind(project.submitted_at)
        .bind(project.submitted_by)
        .bind(project.ranking)
        .bind(project.team_id)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| StoreError::stale("project", project.id))
    }

    /// Delete a project if `version` still matches
    pub async fn delete(pool: &PgPool, project: &Project) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM projects WHERE id = $1 AND version = $2"#)
            .bind(project.id)
            .bind(project.version)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::stale("project", project.id));
        }
        Ok(())
    }
}
