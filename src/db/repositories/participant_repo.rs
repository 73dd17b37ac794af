//! Participant enrollment repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::store::{StoreError, StoreResult, UniqueKey},
    models::Participant,
};

/// Repository for participant enrollment records
pub struct ParticipantRepository;

impl ParticipantRepository {
    /// Insert the first enrollment record for a participant
    pub async fn create(pool: &PgPool, participant: &Participant) -> StoreResult<Participant> {
        let created = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO participants (id, events, version, updated_at)
            VALUES ($1, $2, 1, NOW())
            RETURNING *
            "#,
        )
        .bind(participant.id)
        .bind(&participant.events)
        .fetch_one(pool)
        .await;

        match created {
            Ok(created) => Ok(created),
            // Someone else created the record first; the caller re-reads and retries.
            Err(err) => match StoreError::from(err) {
                StoreError::Duplicate(UniqueKey::ParticipantId) => {
                    Err(StoreError::stale("participant", participant.id))
                }
                other => Err(other),
            },
        }
    }

    /// Find participant by ID
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> StoreResult<Option<Participant>> {
        let participant =
            sqlx::query_as::<_, Participant>(r#"SELECT * FROM participants WHERE id = $1"#)
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(participant)
    }

    /// Write the event set if `version` still matches
    pub async fn update(pool: &PgPool, participant: &Participant) -> StoreResult<Participant> {
        let updated = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participants
            SET events = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(participant.id)
        .bind(participant.version)
        .bind(&participant.events)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| StoreError::stale("participant", participant.id))
    }
}
