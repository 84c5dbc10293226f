//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Fixed-Point Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    1250.10 - 980.20 = 269.89999999999998  ❌ WRONG!                     │
//! │                                                                         │
//! │  A stored margin computed that way drifts from a recomputed one and    │
//! │  the fix-margin flow keeps "repairing" the same sale forever.          │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    1250.10 - 980.20 = 269.90 exactly                                    │
//! │    Sub-cent values from the legacy store (59.995) stay exact too       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike an integer-cents type, `Money` keeps whatever scale it was given.
//! Values are only rounded where a business rule says so (commission payouts).
//!
//! ## Usage
//! ```rust
//! use salesos_core::money::Money;
//!
//! let sale = Money::from_cents(125010); // £1,250.10
//! let buy = Money::from_cents(98020);   // £980.20
//! assert_eq!((sale - buy).to_string(), "£269.90");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::MAX_ABS_AMOUNT;

/// Characters the legacy spreadsheets and the data store wrap around numbers.
const STRIPPED_CHARS: &[char] = &['£', '$', '€', ','];

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major currency units (pounds), held as an exact decimal.
///
/// ## Design Decisions
/// - **Signed**: negative margins are valid and never clamped
/// - **Scale preserving**: `60` and `60.00` compare equal but keep their scale,
///   so recomputing the same input twice yields the same representation
/// - **Serialized as a string**: no precision is lost crossing JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from minor units (pence).
    ///
    /// ## Example
    /// ```rust
    /// use salesos_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "£10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub fn from_major(major: i64) -> Self {
        Money(Decimal::from(major))
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to whole pence using Bankers Rounding (round half to even).
    ///
    /// ```text
    /// 2.345 → 2.34   (4 is even)
    /// 2.355 → 2.36   (6 is even)
    /// ```
    ///
    /// Only payouts are rounded. Margins keep full precision so that
    /// reconciliation compares exact values.
    ///
    /// ## Example
    /// ```rust
    /// use salesos_core::money::Money;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let raw = Money::new(Decimal::from_str("2.345").unwrap());
    /// assert_eq!(raw.round_cents(), Money::from_cents(234));
    /// ```
    pub fn round_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Takes `percent` percent of this amount, rounded to pence.
    ///
    /// ## Example
    /// ```rust
    /// use salesos_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let margin = Money::from_major(1000);
    /// assert_eq!(margin.percent_of(Decimal::from(15)), Money::from_major(150));
    /// ```
    pub fn percent_of(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED).round_cents()
    }

    /// Parses an amount the way the data store and legacy sheets write them.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - Currency symbols (`£`, `$`, `€`) and thousands separators are stripped
    /// - Plain and scientific notation are accepted (`1250.5`, `1.2505e3`)
    /// - Digits past 28 decimal places round away, in either notation
    /// - Magnitudes above [`MAX_ABS_AMOUNT`] are rejected
    ///
    /// Returns `None` for empty or non-numeric input.
    ///
    /// ## Example
    /// ```rust
    /// use salesos_core::money::Money;
    ///
    /// assert_eq!(Money::parse_lenient("£1,250.50"), Some(Money::from_cents(125050)));
    /// assert_eq!(Money::parse_lenient("  "), None);
    /// assert_eq!(Money::parse_lenient("n/a"), None);
    /// ```
    pub fn parse_lenient(raw: &str) -> Option<Money> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !STRIPPED_CHARS.contains(c))
            .collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return None;
        }

        let amount = Decimal::from_str(cleaned)
            .or_else(|_| Decimal::from_scientific(cleaned))
            .ok()
            .or_else(|| shift_scientific(cleaned))?;

        Money::bounded(amount)
    }

    /// Accepts `amount` only if its magnitude is within [`MAX_ABS_AMOUNT`].
    ///
    /// Bounding every input keeps the sum of a sale's components far away
    /// from `Decimal` overflow.
    pub fn bounded(amount: Decimal) -> Option<Money> {
        if amount.abs() > Decimal::from(MAX_ABS_AMOUNT) {
            return None;
        }
        Some(Money(amount))
    }
}

/// Scientific notation whose exponent takes it past `Decimal`'s 28 places
/// (`1e-40`). The mantissa is shifted one place at a time, so digits beyond
/// the last place round away as they do for a long plain decimal, and an
/// oversized positive exponent overflows to `None`.
fn shift_scientific(raw: &str) -> Option<Decimal> {
    let (mantissa, exponent) = raw.split_once(['e', 'E'])?;
    let mut value = Decimal::from_str(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;

    for _ in 0..exponent.unsigned_abs() {
        if value.is_zero() {
            break;
        }
        value = if exponent > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }

    Some(value)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount in pounds, rounded to pence for display.
///
/// ## Note
/// This is for logs and CLI output. The dashboard formats amounts itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{}£{:.2}", sign, self.0.abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
