//! Custom error types and handling
//!
//! This module defines the engine's error type. The presentation layer maps
//! errors to responses through [`AppError::status_code`] and
//! [`AppError::error_code`]; the engine itself never formats responses.

use std::fmt;

use crate::db::StoreError;

/// Business rule that rejected an otherwise well-formed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Team already has the maximum number of members
    TeamFull,
    /// Participant's team has submitted, so its roster is frozen
    SubmissionLocked,
    /// Event is no longer upcoming
    EventStarted,
    /// Project was already submitted
    AlreadySubmitted,
    /// Submitted projects cannot be edited
    LockedAfterSubmission,
    /// Only submitted projects can be judged
    NotSubmitted,
    /// Judging for the event has been released
    JudgingReleased,
    /// Target team already has a project and the caller's solo team holds a draft
    TeamHasProject,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TeamFull => "TeamFull",
            Self::SubmissionLocked => "SubmissionLocked",
            Self::EventStarted => "EventStarted",
            Self::AlreadySubmitted => "AlreadySubmitted",
            Self::LockedAfterSubmission => "LockedAfterSubmission",
            Self::NotSubmitted => "NotSubmitted",
            Self::JudgingReleased => "JudgingReleased",
            Self::TeamHasProject => "TeamHasProject",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    ValidationFailed,
    TransientStorageConflict,
    Internal,
}

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Incomplete submission: missing {}", .missing.join(", "))]
    IncompleteSubmission { missing: Vec<&'static str> },

    // Concurrency errors
    #[error("Concurrent update detected: {0}")]
    TransientStorageConflict(String),

    // Backend errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a not-found error on a named entity
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    /// Get the coarse error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation(_) | Self::IncompleteSubmission { .. } => ErrorKind::ValidationFailed,
            Self::TransientStorageConflict(_) => ErrorKind::TransientStorageConflict,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(reason) => match reason {
                ConflictReason::TeamFull => "TEAM_FULL",
                ConflictReason::SubmissionLocked => "SUBMISSION_LOCKED",
                ConflictReason::EventStarted => "EVENT_STARTED",
                ConflictReason::AlreadySubmitted => "ALREADY_SUBMITTED",
                ConflictReason::LockedAfterSubmission => "LOCKED_AFTER_SUBMISSION",
                ConflictReason::NotSubmitted => "NOT_SUBMITTED",
                ConflictReason::JudgingReleased => "JUDGING_RELEASED",
                ConflictReason::TeamHasProject => "TEAM_HAS_PROJECT",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IncompleteSubmission { .. } => "INCOMPLETE_SUBMISSION",
            Self::TransientStorageConflict(_) => "TRANSIENT_STORAGE_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code the presentation layer should use
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::ValidationFailed => 422,
            ErrorKind::TransientStorageConflict => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStorageConflict(_))
    }

    /// Check for a specific business-rule conflict
    pub fn is_conflict(&self, reason: ConflictReason) -> bool {
        matches!(self, Self::Conflict(r) if *r == reason)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StaleWrite { .. } | StoreError::Duplicate(_) => {
                AppError::TransientStorageConflict(err.to_string())
            }
            StoreError::Backend(message) => AppError::Database(message),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
