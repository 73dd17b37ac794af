//! Input validation utilities

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static JOIN_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4,32}$").expect("join code pattern is valid"));

/// Normalize a join code typed by a participant (trim, uppercase) and check its shape
pub fn normalize_join_code(raw: &str) -> Result<String, &'static str> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err("Join code cannot be empty");
    }
    if !JOIN_CODE_PATTERN.is_match(&code) {
        return Err("Join code must be 4-32 letters or digits");
    }
    Ok(code)
}

/// Validate the ordering of an event's dates
pub fn validate_event_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    submission_deadline: DateTime<Utc>,
) -> Result<(), &'static str> {
    if end <= start {
        return Err("Event must end after it starts");
    }
    if submission_deadline < start || submission_deadline > end {
        return Err("Submission deadline must fall within the event");
    }
    Ok(())
}

/// Sanitize string input (remove control characters, trim whitespace)
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_normalize_join_code() {
        assert_eq!(normalize_join_code(" abc234 ").unwrap(), "ABC234");
        assert!(normalize_join_code("").is_err());
        assert!(normalize_join_code("ab").is_err()); // Too short
        assert!(normalize_join_code("AB-234").is_err()); // Invalid character
    }

    #[test]
    fn test_validate_event_window() {
        let start = Utc::now();
        let end = start + Duration::hours(36);
        assert!(validate_event_window(start, end, end - Duration::hours(2)).is_ok());
        assert!(validate_event_window(end, start, end).is_err());
        assert!(validate_event_window(start, end, end + Duration::hours(1)).is_err());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("  Hack\u{0007} Night \n"), "Hack Night");
    }
}
