//! Team repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::store::{StoreError, StoreResult},
    models::Team,
};

/// Repository for team database operations
pub struct TeamRepository;

impl TeamRepository {
    /// Insert a new team; the join code unique constraint decides races
    pub async fn create(pool: &PgPool, team: &Team) -> StoreResult<Team> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (
                id, join_code, members, event_id, project_id, submitted_project,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8)
            RETURNING *
            "#,
        )
        .bind(team.id)
        .bind(&team.join_code)
        .bind(&team.members)
        .bind(team.event_id)
        .bind(team.project_id)
        .bind(team.submitted_project)
        .bind(team.created_at)
        .bind(team.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(team)
    }

    /// Find team by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> StoreResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(r#"SELECT * FROM teams WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(team)
    }

    /// Find team by join code
    pub async fn find_by_join_code(pool: &PgPool, join_code: &str) -> StoreResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(r#"SELECT * FROM teams WHERE join_code = $1"#)
            .bind(join_code)
            .fetch_optional(pool)
            .await?;

        Ok(team)
    }

    /// Find the participant's team within an event
    pub async fn find_by_member(
        pool: &PgPool,
        event_id: &Uuid,
        participant_id: &Uuid,
    ) -> StoreResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"SELECT * FROM teams WHERE event_id = $1 AND members @> ARRAY[$2]::uuid[] LIMIT 1"#,
        )
        .bind(event_id)
        .bind(participant_id)
        .fetch_optional(pool)
        .await?;

        Ok(team)
    }

    /// List teams of an event in creation order
    pub async fn list_by_event(pool: &PgPool, event_id: &Uuid) -> StoreResult<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            r#"SELECT * FROM teams WHERE event_id = $1 ORDER BY created_at, id"#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(teams)
    }

    /// Write roster and project link if `version` still matches
    pub async fn update(pool: &PgPool, team: &Team) -> StoreResult<Team> {
        let updated = sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET
                members = $3,
                project_id = $4,
                submitted_project = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(team.id)
        .bind(team.version)
        .bind(&team.members)
        .bind(team.project_id)
        .bind(team.submitted_project)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| StoreError::stale("team", team.id))
    }

    /// Delete team if `version` still matches
    pub async fn delete(pool: &PgPool, team: &Team) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM teams WHERE id = $1 AND version = $2"#)
            .bind(team.id)
            .bind(team.version)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::stale("team", team.id));
        }
        Ok(())
    }
}
