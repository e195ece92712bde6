//! Validation error types

use std::fmt;

/// Validation error for guestbook input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length (characters or bytes, see `unit`)
    TooLong {
        field: &'static str,
        max: usize,
        unit: &'static str,
    },

    /// String doesn't match required format (e.g., SQL identifier)
    InvalidFormat { field: &'static str, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max, unit } => {
                write!(f, "{} exceeds maximum length of {} {}", field, max, unit)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 32,
            unit: "characters",
        };
        assert_eq!(err.to_string(), "name exceeds maximum length of 32 characters");
    }
}
