//! Utility functions

pub mod collections;
pub mod crypto;
pub mod validation;

pub use crypto::{generate_join_code, generate_secure_token};
pub use validation::{normalize_join_code, sanitize_string, validate_event_window};
