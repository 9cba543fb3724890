//! ValidationHelpers (spec §4.10): a closed set of precondition
//! predicates that raise structured rejections, so handlers can
//! early-return with one line per business rule.

use crate::error::CommandRejectedError;

pub type ValidationResult = Result<(), CommandRejectedError>;

pub fn require_exists(exists: bool, field: &str) -> ValidationResult {
    if exists {
        Ok(())
    } else {
        Err(CommandRejectedError::new(format!("{field} does not exist")))
    }
}

pub fn require_not_exists(exists: bool, field: &str) -> ValidationResult {
    if exists {
        Err(CommandRejectedError::new(format!("{field} already exists")))
    } else {
        Ok(())
    }
}

pub fn require_positive<T: PartialOrd + Default>(value: T, field: &str) -> ValidationResult {
    if value > T::default() {
        Ok(())
    } else {
        Err(CommandRejectedError::new(format!("{field} must be positive")))
    }
}

pub fn require_non_negative<T: PartialOrd + Default>(value: T, field: &str) -> ValidationResult {
    if value >= T::default() {
        Ok(())
    } else {
        Err(CommandRejectedError::new(format!(
            "{field} must be non-negative"
        )))
    }
}

pub fn require_not_empty_str(value: &str, field: &str) -> ValidationResult {
    if value.is_empty() {
        Err(CommandRejectedError::new(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

pub fn require_not_empty<T>(value: &[T], field: &str) -> ValidationResult {
    if value.is_empty() {
        Err(CommandRejectedError::new(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

pub fn require_status<T: PartialEq + std::fmt::Debug>(
    actual: T,
    expected: T,
    field: &str,
) -> ValidationResult {
    if actual == expected {
        Ok(())
    } else {
        Err(CommandRejectedError::new(format!(
            "{field}: expected {expected:?}, got {actual:?}"
        )))
    }
}

pub fn require_status_not<T: PartialEq + std::fmt::Debug>(
    actual: T,
    forbidden: T,
    field: &str,
) -> ValidationResult {
    if actual == forbidden {
        Err(CommandRejectedError::new(format!(
            "{field} must not be {forbidden:?}"
        )))
    } else {
        Ok(())
    }
}

/// Raises with a message that matches spec §8 scenario 2's expectations.
pub fn require_sequence_match(expected: u32, actual: u32) -> ValidationResult {
    if expected == actual {
        Ok(())
    } else {
        Err(CommandRejectedError::new(format!(
            "sequence mismatch: expected {expected}, got {actual}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_exists_ok_when_true() {
        assert!(require_exists(true, "player").is_ok());
    }

    #[test]
    fn require_exists_rejects_when_false() {
        assert!(require_exists(false, "player").is_err());
    }

    #[test]
    fn require_not_exists_rejects_when_true() {
        assert!(require_not_exists(true, "player").is_err());
    }

    #[test]
    fn require_positive_rejects_zero() {
        assert!(require_positive(0i64, "amount").is_err());
        assert!(require_positive(1i64, "amount").is_ok());
    }

    #[test]
    fn require_non_negative_allows_zero() {
        assert!(require_non_negative(0i64, "amount").is_ok());
        assert!(require_non_negative(-1i64, "amount").is_err());
    }

    #[test]
    fn require_not_empty_str_rejects_empty() {
        assert!(require_not_empty_str("", "name").is_err());
        assert!(require_not_empty_str("A", "name").is_ok());
    }

    #[test]
    fn require_not_empty_rejects_empty_slice() {
        let empty: Vec<i32> = vec![];
        assert!(require_not_empty(&empty, "items").is_err());
        assert!(require_not_empty(&[1], "items").is_ok());
    }

    #[test]
    fn require_status_checks_equality() {
        assert!(require_status("open", "open", "status").is_ok());
        assert!(require_status("open", "closed", "status").is_err());
    }

    #[test]
    fn require_status_not_checks_inequality() {
        assert!(require_status_not("open", "closed", "status").is_ok());
        assert!(require_status_not("closed", "closed", "status").is_err());
    }

    #[test]
    fn sequence_mismatch_message() {
        let err = require_sequence_match(5, 3).unwrap_err();
        assert!(err.0.contains("sequence mismatch"));
    }
}
