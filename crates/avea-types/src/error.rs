//! Error types for command value validation.

use thiserror::Error;

/// Error returned when a command value cannot be encoded.
///
/// Validation happens before any Bluetooth work starts, so a failed
/// validation never leaves a half-finished session behind.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A channel or brightness value outside the device's accepted range.
    #[error("{field} value {value} out of range (0-255)")]
    OutOfRange {
        /// Which value was rejected (`"red"`, `"white"`, `"brightness"`, ...).
        field: &'static str,
        /// The rejected value.
        value: u16,
    },
}

impl ValidationError {
    /// Create an out-of-range error for a named value.
    #[must_use]
    pub fn out_of_range(field: &'static str, value: u16) -> Self {
        ValidationError::OutOfRange { field, value }
    }
}

/// Result alias for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::out_of_range("red", 300);
        assert_eq!(err.to_string(), "red value 300 out of range (0-255)");
    }

    #[test]
    fn test_error_is_copy_and_comparable() {
        let err = ValidationError::out_of_range("brightness", 4096);
        let same = err;
        assert_eq!(err, same);
    }
}
