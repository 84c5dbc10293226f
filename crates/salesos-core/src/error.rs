//! # Error Types
//!
//! Domain-specific error types for salesos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salesos-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  salesos-db errors (separate crate)                                    │
//! │  └── DbError          - Database and reconciliation failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API response            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note that [`calculate_margins`](crate::economics::calculate_margins) has
//! no error path at all; malformed amounts degrade to zero and are reported
//! on the result instead.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A commission band is malformed on its own.
    #[error("Invalid commission band '{band_type}': {reason}")]
    InvalidCommissionBand { band_type: String, reason: String },

    /// Two commission bands claim the same margin range.
    ///
    /// ## When This Occurs
    /// ```text
    /// Band A: £0 – £1,000
    /// Band B: £800 – £5,000   ← £800..£1,000 would pay twice
    /// ```
    #[error("Commission bands '{first}' and '{second}' overlap")]
    OverlappingBands { first: String, second: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OverlappingBands {
            first: "standard".to_string(),
            second: "premium".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Commission bands 'standard' and 'premium' overlap"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sale_reference".to_string(),
        };
        assert_eq!(err.to_string(), "sale_reference is required");

        let err = ValidationError::OutOfRange {
            field: "commission_percent".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };
        assert_eq!(err.to_string(), "commission_percent must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBeNonNegative {
            field: "tolerance".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
