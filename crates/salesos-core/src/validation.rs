//! # Validation Module
//!
//! Input validation utilities for Sales OS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard form (TypeScript)                                  │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── sale references, ids, percentages, tolerances                     │
//! │  └── NOT economics amounts: those are coerced, never rejected          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE / FOREIGN KEY constraints                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salesos_core::validation::{validate_sale_reference, validate_percent};
//! use rust_decimal::Decimal;
//!
//! validate_sale_reference("INV-1001").unwrap();
//! validate_percent("commission_percent", Decimal::from(15)).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewSale;
use crate::MAX_SALE_REFERENCE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a sale reference (invoice number).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens, underscores and slashes only
///
/// ## Example
/// ```rust
/// use salesos_core::validation::validate_sale_reference;
///
/// assert!(validate_sale_reference("INV-1001").is_ok());
/// assert!(validate_sale_reference("2025/10/004").is_ok());
/// assert!(validate_sale_reference("").is_err());
/// ```
pub fn validate_sale_reference(reference: &str) -> ValidationResult<()> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ValidationError::Required {
            field: "sale_reference".to_string(),
        });
    }

    if reference.len() > MAX_SALE_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "sale_reference".to_string(),
            max: MAX_SALE_REFERENCE_LEN,
        });
    }

    if !reference
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sale_reference".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores and slashes"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use salesos_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a percentage (0–100 inclusive).
pub fn validate_percent(field: &str, percent: Decimal) -> ValidationResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }

    Ok(())
}

/// Validates a reconciliation tolerance.
///
/// ## Rules
/// - Must not be negative (zero means "exact match required")
pub fn validate_tolerance(tolerance: Money) -> ValidationResult<()> {
    if tolerance.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "tolerance".to_string(),
        });
    }

    Ok(())
}

/// Parses and validates a tolerance given as text (CLI flag or env var).
pub fn parse_tolerance(raw: &str) -> ValidationResult<Money> {
    let tolerance = Money::parse_lenient(raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: "tolerance".to_string(),
        reason: format!("'{}' is not a decimal amount", raw.trim()),
    })?;

    validate_tolerance(tolerance)?;
    Ok(tolerance)
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a sale before it is recorded.
///
/// Economics amounts are deliberately not checked here; the calculator
/// tolerates anything and the completeness checker reports gaps.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_sale_reference(&sale.sale_reference)?;

    if let Some(introducer_id) = &sale.introducer_id {
        validate_uuid("introducer_id", introducer_id)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::{EconomicsField, EconomicsInput};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_sale_reference() {
        assert!(validate_sale_reference("INV-1001").is_ok());
        assert!(validate_sale_reference("HOPE_2024_17").is_ok());
        assert!(validate_sale_reference("2025/10/004").is_ok());

        assert!(validate_sale_reference("").is_err());
        assert!(validate_sale_reference("   ").is_err());
        assert!(validate_sale_reference("INV 1001").is_err());
        assert!(validate_sale_reference(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent("p", dec!(0)).is_ok());
        assert!(validate_percent("p", dec!(12.5)).is_ok());
        assert!(validate_percent("p", dec!(100)).is_ok());
        assert!(validate_percent("p", dec!(-0.01)).is_err());
        assert!(validate_percent("p", dec!(100.01)).is_err());
    }

    #[test]
    fn test_parse_tolerance() {
        assert_eq!(parse_tolerance("0.01").unwrap(), Money::from_cents(1));
        assert_eq!(parse_tolerance("0").unwrap(), Money::zero());
        assert!(parse_tolerance("-0.01").is_err());
        assert!(parse_tolerance("penny").is_err());
    }

    #[test]
    fn test_validate_new_sale() {
        let mut sale = NewSale {
            sale_reference: "INV-77".to_string(),
            sale_date: Utc::now(),
            introducer_id: None,
            inputs: EconomicsInput::new().with(EconomicsField::SaleAmountExVat, "TBC"),
        };
        assert!(validate_new_sale(&sale).is_ok());

        sale.introducer_id = Some("bob".to_string());
        assert!(validate_new_sale(&sale).is_err());
    }
}
