//! Judge feedback model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{SCORE_MAX, SCORE_MIN};

/// One judge's scores for one project.
///
/// At most one record exists per (judge, project); resubmitting replaces it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JudgeFeedback {
    pub id: Uuid,
    pub judge_id: Uuid,
    pub project_id: Uuid,
    pub creativity: i32,
    pub functionality: i32,
    pub technicality: i32,
    pub interface: i32,
    /// Always the sum of the four component scores
    pub total_score: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JudgeFeedback {
    /// Build an unsaved feedback record; the total is derived from `scores`
    pub fn new(judge_id: Uuid, project_id: Uuid, scores: Scores, comment: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            judge_id,
            project_id,
            creativity: scores.creativity,
            functionality: scores.functionality,
            technicality: scores.technicality,
            interface: scores.interface,
            total_score: scores.total(),
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn scores(&self) -> Scores {
        Scores {
            creativity: self.creativity,
            functionality: self.functionality,
            technicality: self.technicality,
            interface: self.interface,
        }
    }
}

/// Component scores, each within `SCORE_MIN..=SCORE_MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Scores {
    #[validate(range(min = SCORE_MIN, max = SCORE_MAX))]
    pub creativity: i32,
    #[validate(range(min = SCORE_MIN, max = SCORE_MAX))]
    pub functionality: i32,
    #[validate(range(min = SCORE_MIN, max = SCORE_MAX))]
    pub technicality: i32,
    #[validate(range(min = SCORE_MIN, max = SCORE_MAX))]
    pub interface: i32,
}

impl Scores {
    pub fn new(creativity: i32, functionality: i32, technicality: i32, interface: i32) -> Self {
        Self {
            creativity,
            functionality,
            technicality,
            interface,
        }
    }

    /// Unweighted sum
    pub fn total(&self) -> i32 {
        self.creativity + self.functionality + self.technicality + self.interface
    }
}
