//! # Reconciliation Module
//!
//! Compares margins stored on a sale with margins recomputed from its raw
//! inputs, and decides whether the record needs repairing.
//!
//! ## Fix-Margin Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fix-Margin Flow                                  │
//! │                                                                         │
//! │  Load sale (salesos-db)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  calculate_margins(inputs)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reconcile(stored, recomputed, tolerance) ← THIS MODULE                │
//! │       │                                                                 │
//! │       ├── |delta| <  tolerance → "no changes needed"                   │
//! │       └── |delta| >= tolerance → write back, report before/after/delta │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator exposes exact values; the tolerance lives here only.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::economics::MarginResult;
use crate::money::Money;

/// Default drift tolerance: one penny.
pub fn default_tolerance() -> Money {
    Money::from_cents(1)
}

/// The derived values persisted on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MarginField {
    GrossMargin,
    CommissionableMargin,
}

/// Margins currently stored on a sale (either may never have been computed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMargins {
    pub gross_margin: Option<Money>,
    pub commissionable_margin: Option<Money>,
}

/// Before/after comparison for one stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FieldDrift {
    pub field: MarginField,
    pub before: Option<Money>,
    pub after: Money,
    /// `after - before`; `None` when nothing was stored.
    pub delta: Option<Money>,
    pub drifted: bool,
}

impl FieldDrift {
    fn compare(field: MarginField, before: Option<Money>, after: Money, tolerance: Money) -> Self {
        let delta = before.map(|before| after - before);
        let drifted = match delta {
            Some(delta) => !delta.is_zero() && delta.abs() >= tolerance,
            None => true,
        };

        FieldDrift {
            field,
            before,
            after,
            delta,
            drifted,
        }
    }
}

/// Result of comparing stored margins with recomputed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub gross_margin: FieldDrift,
    pub commissionable_margin: FieldDrift,
    pub tolerance: Money,
}

impl ReconciliationOutcome {
    /// True if any stored value should be overwritten.
    pub fn needs_update(&self) -> bool {
        self.gross_margin.drifted || self.commissionable_margin.drifted
    }

    /// The fields that drifted.
    pub fn changes(&self) -> impl Iterator<Item = &FieldDrift> {
        [&self.gross_margin, &self.commissionable_margin]
            .into_iter()
            .filter(|drift| drift.drifted)
    }
}

/// Compares stored margins with a fresh calculation.
///
/// A field drifts when nothing was stored, or when it differs from the
/// fresh value by at least `tolerance`. A zero tolerance means "any
/// difference at all".
///
/// ## Example
/// ```rust
/// use salesos_core::reconcile::{default_tolerance, reconcile, StoredMargins};
/// use salesos_core::economics::{calculate_margins, EconomicsField, EconomicsInput};
/// use salesos_core::money::Money;
///
/// let recomputed = calculate_margins(
///     &EconomicsInput::new()
///         .with(EconomicsField::SaleAmountExVat, 100)
///         .with(EconomicsField::BuyPrice, 40),
/// );
/// let stored = StoredMargins {
///     gross_margin: Some(Money::from_major(50)),
///     commissionable_margin: Some(Money::from_major(60)),
/// };
///
/// let outcome = reconcile(stored, &recomputed, default_tolerance());
/// assert!(outcome.needs_update());
/// assert_eq!(outcome.gross_margin.delta, Some(Money::from_major(10)));
/// ```
pub fn reconcile(
    stored: StoredMargins,
    recomputed: &MarginResult,
    tolerance: Money,
) -> ReconciliationOutcome {
    ReconciliationOutcome {
        gross_margin: FieldDrift::compare(
            MarginField::GrossMargin,
            stored.gross_margin,
            recomputed.gross_margin,
            tolerance,
        ),
        commissionable_margin: FieldDrift::compare(
            MarginField::CommissionableMargin,
            stored.commissionable_margin,
            recomputed.commissionable_margin,
            tolerance,
        ),
        tolerance,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::{calculate_margins, EconomicsField, EconomicsInput};
    use rust_decimal_macros::dec;

    fn sixty() -> MarginResult {
        calculate_margins(
            &EconomicsInput::new()
                .with(EconomicsField::SaleAmountExVat, "100.00")
                .with(EconomicsField::BuyPrice, "40.00"),
        )
    }

    fn stored(gross: Money, commissionable: Money) -> StoredMargins {
        StoredMargins {
            gross_margin: Some(gross),
            commissionable_margin: Some(commissionable),
        }
    }

    #[test]
    fn test_sub_penny_difference_needs_no_change() {
        let s = stored(Money::new(dec!(59.995)), Money::new(dec!(59.995)));
        let outcome = reconcile(s, &sixty(), default_tolerance());

        assert!(!outcome.needs_update());
        assert_eq!(outcome.gross_margin.delta, Some(Money::new(dec!(0.005))));
        assert_eq!(outcome.changes().count(), 0);
    }

    #[test]
    fn test_drift_is_reported_with_delta() {
        let s = stored(Money::from_major(50), Money::from_major(60));
        let outcome = reconcile(s, &sixty(), default_tolerance());

        assert!(outcome.needs_update());
        assert!(outcome.gross_margin.drifted);
        assert!(!outcome.commissionable_margin.drifted);
        assert_eq!(outcome.gross_margin.before, Some(Money::from_major(50)));
        assert_eq!(outcome.gross_margin.after, Money::from_major(60));
        assert_eq!(outcome.gross_margin.delta, Some(Money::from_major(10)));

        let changed: Vec<MarginField> = outcome.changes().map(|d| d.field).collect();
        assert_eq!(changed, vec![MarginField::GrossMargin]);
    }

    #[test]
    fn test_negative_delta_uses_absolute_value() {
        let s = stored(Money::from_major(70), Money::from_major(60));
        let outcome = reconcile(s, &sixty(), default_tolerance());

        assert!(outcome.gross_margin.drifted);
        assert_eq!(outcome.gross_margin.delta, Some(Money::from_major(-10)));
    }

    #[test]
    fn test_exactly_one_penny_counts_as_drift() {
        let s = stored(Money::new(dec!(59.99)), Money::from_major(60));
        let outcome = reconcile(s, &sixty(), default_tolerance());
        assert!(outcome.gross_margin.drifted);
    }

    #[test]
    fn test_never_computed_always_needs_update() {
        let outcome = reconcile(StoredMargins::default(), &sixty(), default_tolerance());

        assert!(outcome.needs_update());
        assert_eq!(outcome.gross_margin.before, None);
        assert_eq!(outcome.gross_margin.delta, None);
    }

    #[test]
    fn test_zero_tolerance_flags_any_difference() {
        let s = stored(Money::new(dec!(59.995)), Money::from_major(60));
        let outcome = reconcile(s, &sixty(), Money::zero());

        assert!(outcome.gross_margin.drifted);
        assert!(!outcome.commissionable_margin.drifted);
    }
}
