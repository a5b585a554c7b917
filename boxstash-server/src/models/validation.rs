//! Validation error types

use std::fmt;

/// Validation error for domain models and request payloads
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., hex NFC tag)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Numeric value below the allowed minimum
    Negative { field: &'static str },

    /// Filter document uses a field the collection doesn't expose
    UnknownField { field: String },

    /// Filter document uses an operator the translator doesn't support
    UnknownOperator { operator: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::Negative { field } => write!(f, "{} must not be negative", field),
            Self::UnknownField { field } => write!(f, "unknown filter field '{}'", field),
            Self::UnknownOperator { operator } => {
                write!(f, "unsupported filter operator '{}'", operator)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reject negative integers for count-like fields.
pub fn non_negative(field: &'static str, value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(value)
}

/// Trim an optional free-text field, mapping blank input to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(Some(trimmed.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 255,
        };
        assert_eq!(
            err.to_string(),
            "name exceeds maximum length of 255 characters"
        );
    }

    #[test]
    fn negative_rejected() {
        assert_eq!(non_negative("capacity", 0), Ok(0));
        assert!(matches!(
            non_negative("capacity", -1),
            Err(ValidationError::Negative { field: "capacity" })
        ));
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("location", Some("   "), 10), Ok(None));
        assert_eq!(optional_text("location", None, 10), Ok(None));
        assert_eq!(
            optional_text("location", Some(" attic "), 10),
            Ok(Some("attic".into()))
        );
        assert!(optional_text("location", Some("way too long"), 3).is_err());
    }
}
