//! Domain models
//!
//! This module contains all domain models used throughout the engine.

pub mod event;
pub mod feedback;
pub mod participant;
pub mod project;
pub mod team;

pub use event::*;
pub use feedback::*;
pub use participant::*;
pub use project::*;
pub use team::*;
