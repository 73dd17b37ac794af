//! Event repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::store::{StoreError, StoreResult},
    models::Event,
};

/// Repository for event database operations
pub struct EventRepository;

impl EventRepository {
    /// Insert a new event
    pub async fn create(pool: &PgPool, event: &Event) -> StoreResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                id, name, description, location, start_date, end_date,
                submission_deadline, participants, teams, checked_in, projects,
                released_judging, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1, $13, $14)
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.submission_deadline)
        .bind(&event.participants)
        .bind(&event.teams)
        .bind(&event.checked_in)
        .bind(&event.projects)
        .bind(event.released_judging)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(r#"SELECT * FROM events WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(event)
    }

    /// Write membership sets and the release latch if `version` still matches
    pub async fn update(pool: &PgPool, event: &Event) -> StoreResult<Event> {
        let updated = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET
                participants = $3,
                teams = $4,
                checked_in = $5,
                projects = $6,
                released_judging = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(event.version)
        .bind(&event.participants)
        .bind(&event.teams)
        .bind(&event.checked_in)
        .bind(&event.projects)
        .bind(event.released_judging)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| StoreError::stale("event", event.id))
    }
}
