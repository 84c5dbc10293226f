//! # Commission Module
//!
//! Downstream consumers of the two margins.
//!
//! ## Who Gets Paid From What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Commission Flow                                   │
//! │                                                                         │
//! │  gross_margin ──────────► introducer_commission  (introducer's %)      │
//! │                                                                         │
//! │  commissionable_margin ─► CommissionBands::select ─► staff commission  │
//! │                                                   └► house share       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither function recomputes margins; callers pass the values produced by
//! [`calculate_margins`](crate::economics::calculate_margins).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CommissionBand, Introducer};
use crate::validation::validate_percent;

// =============================================================================
// Introducer Commission
// =============================================================================

/// The introducer's share of a sale's gross margin.
///
/// Loss-making or zero-margin sales pay nothing.
///
/// ## Example
/// ```rust
/// use salesos_core::commission::introducer_commission;
/// use salesos_core::types::Introducer;
/// use salesos_core::money::Money;
/// use rust_decimal::Decimal;
///
/// let introducer = Introducer {
///     id: "i-1".to_string(),
///     name: "Hope Referrals".to_string(),
///     commission_percent: Decimal::from(10),
/// };
/// let due = introducer_commission(Money::from_cents(5950), &introducer);
/// assert_eq!(due, Money::from_cents(595));
/// ```
pub fn introducer_commission(gross_margin: Money, introducer: &Introducer) -> Money {
    if !gross_margin.is_positive() {
        return Money::zero();
    }
    gross_margin.percent_of(introducer.commission_percent)
}

// =============================================================================
// Commission Bands
// =============================================================================

/// A validated, non-overlapping set of commission bands, sorted by threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommissionBands {
    bands: Vec<CommissionBand>,
}

impl CommissionBands {
    /// Validates and sorts `bands`.
    ///
    /// ## Errors
    /// - [`CoreError::Validation`] if a percentage is outside 0–100
    /// - [`CoreError::InvalidCommissionBand`] if `max_threshold < min_threshold`
    /// - [`CoreError::OverlappingBands`] if two ranges intersect
    pub fn new(mut bands: Vec<CommissionBand>) -> CoreResult<Self> {
        for band in &bands {
            validate_percent("commission_percent", band.commission_percent)?;

            if let Some(max) = band.max_threshold {
                if max < band.min_threshold {
                    return Err(CoreError::InvalidCommissionBand {
                        band_type: band.band_type.clone(),
                        reason: format!(
                            "max threshold {} is below min threshold {}",
                            max, band.min_threshold
                        ),
                    });
                }
            }
        }

        bands.sort_by(|a, b| a.min_threshold.cmp(&b.min_threshold));

        for pair in bands.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            let overlaps = match lower.max_threshold {
                None => true,
                Some(max) => upper.min_threshold < max,
            };
            if overlaps {
                return Err(CoreError::OverlappingBands {
                    first: lower.band_type.clone(),
                    second: upper.band_type.clone(),
                });
            }
        }

        Ok(CommissionBands { bands })
    }

    /// The band whose `[min, max)` range contains `commissionable_margin`.
    pub fn select(&self, commissionable_margin: Money) -> Option<&CommissionBand> {
        self.bands
            .iter()
            .find(|band| band.contains(commissionable_margin))
    }

    pub fn as_slice(&self) -> &[CommissionBand] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// How a commissionable margin divides between staff and house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSplit {
    /// `band_type` of the matched band, if any.
    pub band: Option<String>,
    pub staff_commission: Money,
    pub house_share: Money,
}

/// Splits a commissionable margin using the matching band.
///
/// The two shares always sum to the margin exactly.
pub fn split_commission(commissionable_margin: Money, bands: &CommissionBands) -> CommissionSplit {
    let band = bands.select(commissionable_margin);

    let staff_commission = match band {
        Some(band) if commissionable_margin.is_positive() => {
            commissionable_margin.percent_of(band.commission_percent)
        }
        _ => Money::zero(),
    };

    CommissionSplit {
        band: band.map(|b| b.band_type.clone()),
        staff_commission,
        house_share: commissionable_margin - staff_commission,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn band(band_type: &str, min: i64, max: Option<i64>, percent: Decimal) -> CommissionBand {
        CommissionBand {
            band_type: band_type.to_string(),
            min_threshold: Money::from_major(min),
            max_threshold: max.map(Money::from_major),
            commission_percent: percent,
        }
    }

    fn standard_bands() -> CommissionBands {
        CommissionBands::new(vec![
            band("premium", 1000, None, dec!(15)),
            band("standard", 0, Some(1000), dec!(10)),
        ])
        .unwrap()
    }

    fn introducer(percent: Decimal) -> Introducer {
        Introducer {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            name: "Hope Referrals".to_string(),
            commission_percent: percent,
        }
    }

    #[test]
    fn test_introducer_commission() {
        let due = introducer_commission(Money::from_major(400), &introducer(dec!(12.5)));
        assert_eq!(due, Money::from_major(50));
    }

    #[test]
    fn test_introducer_commission_rounds_bankers() {
        // 0.25 * 10% = 0.025 -> 0.02
        let due = introducer_commission(Money::from_cents(25), &introducer(dec!(10)));
        assert_eq!(due, Money::from_cents(2));
    }

    #[test]
    fn test_loss_pays_no_introducer_commission() {
        assert!(introducer_commission(Money::from_major(-80), &introducer(dec!(10))).is_zero());
        assert!(introducer_commission(Money::zero(), &introducer(dec!(10))).is_zero());
    }

    #[test]
    fn test_bands_are_sorted() {
        let bands = standard_bands();
        assert_eq!(bands.as_slice()[0].band_type, "standard");
        assert_eq!(bands.as_slice()[1].band_type, "premium");
    }

    #[test]
    fn test_select_band_boundaries() {
        let bands = standard_bands();
        assert_eq!(bands.select(Money::zero()).unwrap().band_type, "standard");
        assert_eq!(
            bands.select(Money::new(dec!(999.99))).unwrap().band_type,
            "standard"
        );
        assert_eq!(bands.select(Money::from_major(1000)).unwrap().band_type, "premium");
        assert!(bands.select(Money::from_major(-5)).is_none());
    }

    #[test]
    fn test_split_commission() {
        let split = split_commission(Money::from_major(2000), &standard_bands());

        assert_eq!(split.band.as_deref(), Some("premium"));
        assert_eq!(split.staff_commission, Money::from_major(300));
        assert_eq!(split.house_share, Money::from_major(1700));
    }

    #[test]
    fn test_split_without_matching_band_keeps_all_for_house() {
        let split = split_commission(Money::from_major(-50), &standard_bands());

        assert_eq!(split.band, None);
        assert!(split.staff_commission.is_zero());
        assert_eq!(split.house_share, Money::from_major(-50));
    }

    #[test]
    fn test_split_sums_to_margin() {
        let margin = Money::new(dec!(333.33));
        let split = split_commission(margin, &standard_bands());
        assert_eq!(split.staff_commission + split.house_share, margin);
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let result = CommissionBands::new(vec![
            band("standard", 0, Some(1000), dec!(10)),
            band("premium", 800, Some(5000), dec!(15)),
        ]);
        assert!(matches!(result, Err(CoreError::OverlappingBands { .. })));

        let result = CommissionBands::new(vec![
            band("open", 0, None, dec!(10)),
            band("premium", 5000, None, dec!(15)),
        ]);
        assert!(matches!(result, Err(CoreError::OverlappingBands { .. })));
    }

    #[test]
    fn test_invalid_band_rejected() {
        let result = CommissionBands::new(vec![band("broken", 1000, Some(500), dec!(10))]);
        assert!(matches!(result, Err(CoreError::InvalidCommissionBand { .. })));

        let result = CommissionBands::new(vec![band("greedy", 0, None, dec!(120))]);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_empty_bands() {
        let bands = CommissionBands::new(Vec::new()).unwrap();
        assert!(bands.is_empty());
        assert!(split_commission(Money::from_major(100), &bands).staff_commission.is_zero());
    }
}
