//! Join code allocation

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::{
    db::{StoreError, UniqueKey},
    error::{AppError, AppResult},
    models::Team,
    state::AppState,
    utils::generate_join_code,
};

/// Pick a random code that is not in `existing`.
///
/// The set is only a snapshot; the unique constraint on insert is what
/// actually guarantees uniqueness.
pub fn allocate_join_code(existing: &HashSet<String>, length: usize) -> String {
    loop {
        let code = generate_join_code(length);
        if !existing.contains(&code) {
            return code;
        }
    }
}

/// Insert a one-member team under a freshly allocated join code.
///
/// The unique constraint decides collisions. A rejected code joins the
/// exclusion set and a new one is drawn, up to `join_code_attempts` times.
pub async fn insert_solo_team(
    state: &AppState,
    event_id: Uuid,
    participant_id: Uuid,
) -> AppResult<Team> {
    let config = state.config();
    let mut taken = HashSet::new();

    for attempt in 1..=config.join_code_attempts {
        let code = allocate_join_code(&taken, config.join_code_length);
        let team = Team::solo(event_id, participant_id, code);

        match state.store().insert_team(&team).await {
            Ok(team) => return Ok(team),
            Err(StoreError::Duplicate(UniqueKey::TeamJoinCode)) => {
                debug!(attempt, join_code = %team.join_code, "Join code taken, drawing another");
                taken.insert(team.join_code);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::TransientStorageConflict(format!(
        "no free join code after {} attempts",
        config.join_code_attempts
    )))
}
