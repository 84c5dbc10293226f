//! # Completeness Module
//!
//! Inspects which economics inputs are present before computing margins, so
//! the dashboard can prompt for missing data instead of showing a
//! misleading zero.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale form                                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  assess_completeness(input) ← THIS MODULE                              │
//! │       │                                                                 │
//! │       ├── Insufficient → "Enter sale price and buy price"              │
//! │       ├── Partial      → margin shown, "3 costs assumed £0" badge      │
//! │       └── Complete     → margin shown                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::economics::{EconomicsField, EconomicsInput, FieldValue};

/// Overall verdict for a sale's economics inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessStatus {
    /// Every relevant field holds a number.
    Complete,
    /// Revenue and cost basis are known; some cost fields will default to zero.
    Partial,
    /// Revenue or cost basis is missing or unreadable.
    Insufficient,
}

/// Which fields are missing or unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    /// Revenue / cost basis fields with no value.
    pub missing_required: Vec<EconomicsField>,
    /// Cost fields with no value (they default to zero).
    pub missing_defaulted: Vec<EconomicsField>,
    /// Fields holding something that is not a number.
    pub unparseable: Vec<EconomicsField>,
}

impl CompletenessReport {
    /// True if a margin computed from this input is meaningful.
    pub fn can_calculate(&self) -> bool {
        self.missing_required.is_empty()
            && !self.unparseable.iter().any(EconomicsField::is_required)
    }

    pub fn status(&self) -> CompletenessStatus {
        if !self.can_calculate() {
            CompletenessStatus::Insufficient
        } else if self.missing_defaulted.is_empty() && self.unparseable.is_empty() {
            CompletenessStatus::Complete
        } else {
            CompletenessStatus::Partial
        }
    }

    /// Every field the user should be prompted for, in waterfall order.
    pub fn fields_to_prompt(&self) -> Vec<EconomicsField> {
        EconomicsField::ALL
            .into_iter()
            .filter(|field| {
                self.missing_required.contains(field)
                    || self.missing_defaulted.contains(field)
                    || self.unparseable.contains(field)
            })
            .collect()
    }
}

/// Assesses a sale that has (or may have) an introducer.
pub fn assess_completeness(input: &EconomicsInput) -> CompletenessReport {
    assess_with_introducer(input, true)
}

/// Assesses a sale; without an introducer a missing introducer commission
/// is expected and not reported.
pub fn assess_with_introducer(input: &EconomicsInput, has_introducer: bool) -> CompletenessReport {
    let mut report = CompletenessReport {
        missing_required: Vec::new(),
        missing_defaulted: Vec::new(),
        unparseable: Vec::new(),
    };

    for field in EconomicsField::ALL {
        if field == EconomicsField::IntroducerCommission && !has_introducer {
            continue;
        }

        match input.resolve(field) {
            FieldValue::Present(_) => {}
            FieldValue::Missing if field.is_required() => report.missing_required.push(field),
            FieldValue::Missing => report.missing_defaulted.push(field),
            FieldValue::Unparseable => report.unparseable.push(field),
        }
    }

    report
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> EconomicsInput {
        EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, 1000)
            .with(EconomicsField::BuyPrice, 600)
            .with(EconomicsField::ShippingCost, 20)
            .with(EconomicsField::CardFees, "15.00")
            .with(EconomicsField::DirectCosts, 0)
            .with(EconomicsField::IntroducerCommission, 50)
    }

    #[test]
    fn test_complete_input() {
        let report = assess_completeness(&full_input());
        assert_eq!(report.status(), CompletenessStatus::Complete);
        assert!(report.can_calculate());
        assert!(report.fields_to_prompt().is_empty());
    }

    #[test]
    fn test_missing_costs_is_partial() {
        let input = EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, 100)
            .with(EconomicsField::BuyPrice, 40);
        let report = assess_completeness(&input);

        assert_eq!(report.status(), CompletenessStatus::Partial);
        assert!(report.can_calculate());
        assert_eq!(report.missing_defaulted.len(), 4);
    }

    #[test]
    fn test_missing_buy_price_is_insufficient() {
        let mut input = full_input();
        input.set(EconomicsField::BuyPrice, None);
        let report = assess_completeness(&input);

        assert_eq!(report.status(), CompletenessStatus::Insufficient);
        assert_eq!(report.missing_required, vec![EconomicsField::BuyPrice]);
    }

    #[test]
    fn test_unreadable_revenue_is_insufficient() {
        let input = full_input().with(EconomicsField::SaleAmountExVat, "call me");
        let report = assess_completeness(&input);

        assert!(!report.can_calculate());
        assert_eq!(report.unparseable, vec![EconomicsField::SaleAmountExVat]);
        assert_eq!(report.fields_to_prompt(), vec![EconomicsField::SaleAmountExVat]);
    }

    #[test]
    fn test_unreadable_cost_is_partial() {
        let input = full_input().with(EconomicsField::CardFees, "pending");
        assert_eq!(assess_completeness(&input).status(), CompletenessStatus::Partial);
    }

    #[test]
    fn test_introducer_commission_ignored_without_introducer() {
        let mut input = full_input();
        input.set(EconomicsField::IntroducerCommission, None);

        assert_eq!(
            assess_with_introducer(&input, false).status(),
            CompletenessStatus::Complete
        );
        assert_eq!(
            assess_with_introducer(&input, true).missing_defaulted,
            vec![EconomicsField::IntroducerCommission]
        );
    }

    #[test]
    fn test_blank_string_counts_as_missing() {
        let input = full_input().with(EconomicsField::ShippingCost, "   ");
        let report = assess_completeness(&input);
        assert_eq!(report.missing_defaulted, vec![EconomicsField::ShippingCost]);
        assert!(report.unparseable.is_empty());
    }
}
