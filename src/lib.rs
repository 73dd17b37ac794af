//! Hackfest - Participant, Team and Project Lifecycle Engine
//!
//! This library provides the rules of a multi-day hackathon event: who is
//! enrolled, which team each participant is on, how a team's project moves
//! from draft to submission, how judges score it, and how final rankings are
//! released and announced.
//!
//! # Features
//!
//! - Unique team join codes allocated against a storage constraint
//! - Roster changes that never leave a participant without a team
//! - One-way project submission that freezes the team roster
//! - Judge feedback keyed by (judge, project) with replace-on-resubmit
//! - Idempotent judging release with background result notifications
//!
//! # Architecture
//!
//! The engine follows a layered architecture:
//! - **Services**: Business rules, one per concern
//! - **Store**: Storage contract with compare-and-set writes
//! - **Repositories**: PostgreSQL access behind the store
//! - **Models**: Domain documents and inputs
//!
//! Authentication, HTTP routing and mail delivery live outside this crate.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
