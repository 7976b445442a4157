//! Predicates over participant identity and session payloads.
//!
//! These are pure functions: the session uses them to gate recording, and
//! stores use them to gate writes.

use crate::error::{SessionError, SessionResult};
use crate::point::Questionnaire;

/// Lowest accepted confidence rating.
pub const MIN_CONFIDENCE: u8 = 1;
/// Highest accepted confidence rating.
pub const MAX_CONFIDENCE: u8 = 5;

/// A participant id is a non-empty string of ASCII digits.
pub fn is_valid_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// A participant name must contain something other than whitespace.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Check both identity fields, reporting the first one that fails.
pub fn validate_identity(id: &str, name: &str) -> SessionResult<()> {
    if !is_valid_numeric_id(id) {
        return Err(SessionError::Validation(format!(
            "participant id must be numeric, got {id:?}"
        )));
    }
    if !is_valid_name(name) {
        return Err(SessionError::Validation(
            "participant name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Confidence must be within `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.
pub fn validate_confidence(confidence: u8) -> SessionResult<()> {
    if (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
        Ok(())
    } else {
        Err(SessionError::Validation(format!(
            "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}, got {confidence}"
        )))
    }
}

/// Normalized coordinates must be finite and inside `[0, 1]`.
pub fn validate_normalized(x: f64, y: f64) -> SessionResult<()> {
    let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    if in_range(x) && in_range(y) {
        Ok(())
    } else {
        Err(SessionError::Validation(format!(
            "normalized coordinates out of range: ({x}, {y})"
        )))
    }
}

/// Everything a store needs to accept a save.
pub fn validate_save_payload(
    id: &str,
    name: &str,
    confidence: u8,
    questionnaire: &Questionnaire,
) -> SessionResult<()> {
    validate_identity(id, name)?;
    validate_confidence(confidence)?;
    let missing = questionnaire.unanswered();
    if !missing.is_empty() {
        let keys: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        return Err(SessionError::Validation(format!(
            "unanswered questionnaire items: {}",
            keys.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::QuestionKey;

    #[test]
    fn test_numeric_id() {
        assert!(is_valid_numeric_id("0042"));
        assert!(!is_valid_numeric_id(""));
        assert!(!is_valid_numeric_id("12a"));
        assert!(!is_valid_numeric_id("-1"));
        assert!(!is_valid_numeric_id(" 12"));
    }

    #[test]
    fn test_name() {
        assert!(is_valid_name("Ada"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("   "));
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(validate_confidence(1).is_ok());
        assert!(validate_confidence(5).is_ok());
        assert!(matches!(validate_confidence(0), Err(SessionError::Validation(_))));
        assert!(matches!(validate_confidence(6), Err(SessionError::Validation(_))));
    }

    #[test]
    fn test_normalized_range() {
        assert!(validate_normalized(0.0, 1.0).is_ok());
        assert!(validate_normalized(1.01, 0.5).is_err());
        assert!(validate_normalized(0.5, f64::NAN).is_err());
    }

    #[test]
    fn test_save_payload_requires_all_answers() {
        let mut q = Questionnaire::default();
        q.set(QuestionKey::Q1, "yes".into());
        q.set(QuestionKey::Q2, "no".into());
        q.set(QuestionKey::Q3, "often".into());
        let err = validate_save_payload("7", "Ada", 3, &q).unwrap_err();
        assert!(err.to_string().contains("q4"));

        q.set(QuestionKey::Q4, "never".into());
        assert!(validate_save_payload("7", "Ada", 3, &q).is_ok());
        assert!(validate_save_payload("x", "Ada", 3, &q).is_err());
    }
}
