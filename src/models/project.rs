//! Project model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{
    MAX_PROJECT_DESCRIPTION_LENGTH, MAX_PROJECT_NAME_LENGTH, MAX_REFERENCE_LENGTH,
};

/// Project database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub code_url: Option<String>,
    /// Opaque reference returned by the media store
    pub screenshot_ref: Option<String>,
    /// Opaque reference returned by the media store
    pub video_ref: Option<String>,
    pub demo_url: Option<String>,
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<Uuid>,
    /// Final position, written once judging is released
    pub ranking: Option<i32>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Build an unsaved draft owned by `team_id`
    pub fn draft(event_id: Uuid, team_id: Uuid, fields: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            description: fields.description,
            code_url: fields.code_url,
            screenshot_ref: fields.screenshot_ref,
            video_ref: fields.video_ref,
            demo_url: fields.demo_url,
            event_id,
            team_id,
            submitted_at: None,
            submitted_by: None,
            ranking: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ProjectStatus {
        if self.submitted_at.is_some() {
            ProjectStatus::Submitted
        } else {
            ProjectStatus::Draft
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// Fields that must be present before submission but are not
    pub fn missing_for_submission(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.code_url) {
            missing.push("code_url");
        }
        if is_blank(&self.screenshot_ref) {
            missing.push("screenshot");
        }
        if is_blank(&self.video_ref) {
            missing.push("video");
        }
        missing
    }

    /// Replace every field the patch carries
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(code_url) = patch.code_url {
            self.code_url = Some(code_url);
        }
        if let Some(screenshot_ref) = patch.screenshot_ref {
            self.screenshot_ref = Some(screenshot_ref);
        }
        if let Some(video_ref) = patch.video_ref {
            self.video_ref = Some(video_ref);
        }
        if let Some(demo_url) = patch.demo_url {
            self.demo_url = Some(demo_url);
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_none_or(str::is_empty)
}

/// Project lifecycle: `Draft -> Submitted`, never back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft,
    Submitted,
}

/// Fields supplied when a team starts its project
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = MAX_PROJECT_NAME_LENGTH))]
    pub name: String,

    #[validate(length(max = MAX_PROJECT_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[validate(url, length(max = MAX_REFERENCE_LENGTH))]
    pub code_url: Option<String>,

    #[validate(length(min = 1, max = MAX_REFERENCE_LENGTH))]
    pub screenshot_ref: Option<String>,

    #[validate(length(min = 1, max = MAX_REFERENCE_LENGTH))]
    pub video_ref: Option<String>,

    #[validate(url, length(max = MAX_REFERENCE_LENGTH))]
    pub demo_url: Option<String>,
}

/// Partial update of a draft; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectPatch {
    #[validate(length(min = 1, max = MAX_PROJECT_NAME_LENGTH))]
    pub name: Option<String>,

    #[validate(length(max = MAX_PROJECT_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[validate(url, length(max = MAX_REFERENCE_LENGTH))]
    pub code_url: Option<String>,

    #[validate(length(min = 1, max = MAX_REFERENCE_LENGTH))]
    pub screenshot_ref: Option<String>,

    #[validate(length(min = 1, max = MAX_REFERENCE_LENGTH))]
    pub video_ref: Option<String>,

    #[validate(url, length(max = MAX_REFERENCE_LENGTH))]
    pub demo_url: Option<String>,
}
