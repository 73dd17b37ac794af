//! Application-wide constants
//!
//! This module contains all constant values used throughout the engine.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default Redis URL for the notification queue
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Default Redis list the notification worker consumes
pub const DEFAULT_NOTIFICATION_QUEUE: &str = "hackfest:notifications";

// =============================================================================
// TEAM & JOIN CODE DEFAULTS
// =============================================================================

/// Maximum number of members on a single team
pub const DEFAULT_MAX_TEAM_SIZE: usize = 4;

/// Length of generated join codes
pub const DEFAULT_JOIN_CODE_LENGTH: usize = 6;

/// How many codes are tried before allocation gives up
pub const DEFAULT_JOIN_CODE_ATTEMPTS: u32 = 16;

/// Join code alphabet. Excludes 0/O and 1/I/L so codes can be read aloud.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

// =============================================================================
// STORAGE COORDINATION
// =============================================================================

/// Attempts made when a compare-and-set write is rejected as stale
pub const DEFAULT_STORAGE_RETRY_ATTEMPTS: u32 = 3;

// =============================================================================
// PROJECTS
// =============================================================================

/// Maximum project name length
pub const MAX_PROJECT_NAME_LENGTH: u64 = 120;

/// Maximum project description length
pub const MAX_PROJECT_DESCRIPTION_LENGTH: u64 = 10_000;

/// Maximum length of a URL or media reference
pub const MAX_REFERENCE_LENGTH: u64 = 2048;

/// Maximum event name length
pub const MAX_EVENT_NAME_LENGTH: u64 = 200;

// =============================================================================
// JUDGING
// =============================================================================

/// Lowest score a judge may give for a single criterion
pub const SCORE_MIN: i32 = 0;

/// Highest score a judge may give for a single criterion
pub const SCORE_MAX: i32 = 10;

/// Maximum judge comment length
pub const MAX_COMMENT_LENGTH: u64 = 5_000;

/// Projects ranked at or above this position get the winner message
pub const WINNER_RANK_CUTOFF: i32 = 3;

// =============================================================================
// USER ROLES
// =============================================================================

/// Role identifiers supplied by the identity collaborator
pub mod roles {
    pub const PARTICIPANT: &str = "participant";
    pub const ORGANIZER: &str = "organizer";
    pub const JUDGE: &str = "judge";
}

// =============================================================================
// NOTIFICATION KINDS
// =============================================================================

/// Message kinds handed to the notification collaborator
pub mod message_kinds {
    pub const WINNER: &str = "judging_winner";
    pub const PARTICIPANT: &str = "judging_participant";
}
