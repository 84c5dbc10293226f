//! Margin resolution for trades imported from the legacy spreadsheets.
//!
//! Old sheets carry a hand-entered margin column that is often blank. When
//! it is, the margin is derived from the sell and buy prices instead.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::economics::{FieldValue, RawAmount};
use crate::money::Money;

/// Where a legacy trade's margin came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "source", content = "margin", rename_all = "snake_case")]
pub enum LegacyMargin {
    /// The sheet's own margin column.
    Recorded(Money),
    /// `sell - buy`, because the recorded margin was blank, zero or garbage.
    Derived(Money),
}

impl LegacyMargin {
    pub fn amount(&self) -> Money {
        match self {
            LegacyMargin::Recorded(m) | LegacyMargin::Derived(m) => *m,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, LegacyMargin::Derived(_))
    }
}

/// Picks the recorded margin if it coerces to a non-zero amount, otherwise
/// derives it from sell and buy (each coerced to zero when unusable).
///
/// ## Example
/// ```rust
/// use salesos_core::legacy::{resolve_legacy_margin, LegacyMargin};
/// use salesos_core::economics::RawAmount;
/// use salesos_core::money::Money;
///
/// let sell = RawAmount::from("£1,200");
/// let buy = RawAmount::from(900);
/// let margin = resolve_legacy_margin(None, Some(&sell), Some(&buy));
/// assert_eq!(margin, LegacyMargin::Derived(Money::from_major(300)));
/// ```
pub fn resolve_legacy_margin(
    recorded: Option<&RawAmount>,
    sell: Option<&RawAmount>,
    buy: Option<&RawAmount>,
) -> LegacyMargin {
    match FieldValue::resolve(recorded) {
        FieldValue::Present(margin) if !margin.is_zero() => LegacyMargin::Recorded(margin),
        _ => LegacyMargin::Derived(
            FieldValue::resolve(sell).or_zero() - FieldValue::resolve(buy).or_zero(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_recorded_margin_wins() {
        let recorded = RawAmount::from("250");
        let sell = RawAmount::from(1200);
        let buy = RawAmount::from(900);

        let margin = resolve_legacy_margin(Some(&recorded), Some(&sell), Some(&buy));
        assert_eq!(margin, LegacyMargin::Recorded(Money::from_major(250)));
        assert!(!margin.is_derived());
    }

    #[test]
    fn test_zero_or_blank_recorded_margin_is_derived() {
        let sell = RawAmount::from("1,200.50");
        let buy = RawAmount::from(900);

        for recorded in [RawAmount::from(0), RawAmount::from(""), RawAmount::from("n/a")] {
            let margin = resolve_legacy_margin(Some(&recorded), Some(&sell), Some(&buy));
            assert_eq!(margin, LegacyMargin::Derived(Money::new(dec!(300.50))));
        }
    }

    #[test]
    fn test_negative_recorded_margin_is_kept() {
        let recorded = RawAmount::from(-40);
        let margin = resolve_legacy_margin(Some(&recorded), None, None);
        assert_eq!(margin.amount(), Money::from_major(-40));
    }

    #[test]
    fn test_nothing_usable_derives_zero() {
        let margin = resolve_legacy_margin(None, None, Some(&RawAmount::from("TBC")));
        assert_eq!(margin, LegacyMargin::Derived(Money::zero()));
    }
}
