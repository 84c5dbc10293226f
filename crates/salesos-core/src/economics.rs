//! # Economics Module
//!
//! The margin calculator. This is the ONLY place in the system where gross
//! and commissionable margin are computed; the dashboard, the sale store and
//! the fix-margin flow all call [`calculate_margins`].
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Margin Waterfall                                │
//! │                                                                         │
//! │   saleAmountExVat                                                      │
//! │     − buyPrice                                                         │
//! │     − shippingCost                                                     │
//! │     − cardFees                                                         │
//! │     − directCosts                                                      │
//! │   ─────────────────────                                                │
//! │   = grossMargin                                                        │
//! │     − introducerCommission                                             │
//! │   ─────────────────────                                                │
//! │   = commissionableMargin   (base for staff commission bands)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Coercion
//! Fields arrive from the store as JSON numbers, decimal strings or null.
//! Every field is coerced to an exact decimal; null, empty and non-numeric
//! values count as zero. The result records which fields were missing or
//! unparseable so callers can tell "no data" from "a genuine zero margin".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Economics Field
// =============================================================================

/// One of the six monetary inputs of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum EconomicsField {
    /// Revenue excluding VAT.
    SaleAmountExVat,
    /// Cost basis.
    BuyPrice,
    ShippingCost,
    CardFees,
    DirectCosts,
    /// Commission owed to a referring party.
    IntroducerCommission,
}

impl EconomicsField {
    /// Every field, in waterfall order.
    pub const ALL: [EconomicsField; 6] = [
        EconomicsField::SaleAmountExVat,
        EconomicsField::BuyPrice,
        EconomicsField::ShippingCost,
        EconomicsField::CardFees,
        EconomicsField::DirectCosts,
        EconomicsField::IntroducerCommission,
    ];

    /// The wire name used by the data store.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EconomicsField::SaleAmountExVat => "saleAmountExVat",
            EconomicsField::BuyPrice => "buyPrice",
            EconomicsField::ShippingCost => "shippingCost",
            EconomicsField::CardFees => "cardFees",
            EconomicsField::DirectCosts => "directCosts",
            EconomicsField::IntroducerCommission => "introducerCommission",
        }
    }

    /// Revenue and cost basis cannot be defaulted without producing a
    /// misleading margin.
    pub const fn is_required(&self) -> bool {
        matches!(
            self,
            EconomicsField::SaleAmountExVat | EconomicsField::BuyPrice
        )
    }
}

impl fmt::Display for EconomicsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Raw Amount
// =============================================================================

/// A monetary field as it arrives from the data store.
///
/// Absent and `null` values are represented by `Option::None` on
/// [`EconomicsInput`], not by a variant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number (`40.5`).
    Number(serde_json::Number),
    /// A string (`"40.50"`, `"£1,250"`, `""`, `"TBC"`).
    Text(String),
}

impl RawAmount {
    /// Coerces to an exact amount, or `None` if the value is not a number.
    pub fn to_money(&self) -> Option<Money> {
        match self {
            // Number's Display is the shortest round-trip form ("40.5"),
            // so parsing it back gives the decimal the user typed.
            RawAmount::Number(n) => Money::parse_lenient(&n.to_string()),
            RawAmount::Text(s) => Money::parse_lenient(s),
        }
    }

    /// The value as text, exactly as supplied (for storage).
    pub fn to_text(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.clone(),
        }
    }

    /// Blank strings are treated like a missing value, not a bad one.
    fn is_blank(&self) -> bool {
        matches!(self, RawAmount::Text(s) if s.trim().is_empty())
    }
}

impl From<i32> for RawAmount {
    fn from(v: i32) -> Self {
        RawAmount::Number(serde_json::Number::from(v))
    }
}

impl From<i64> for RawAmount {
    fn from(v: i64) -> Self {
        RawAmount::Number(serde_json::Number::from(v))
    }
}

impl From<f64> for RawAmount {
    fn from(v: f64) -> Self {
        match serde_json::Number::from_f64(v) {
            Some(n) => RawAmount::Number(n),
            // NaN and infinities cannot be JSON numbers; keep them as text
            // so they coerce as unparseable.
            None => RawAmount::Text(v.to_string()),
        }
    }
}

impl From<&str> for RawAmount {
    fn from(v: &str) -> Self {
        RawAmount::Text(v.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(v: String) -> Self {
        RawAmount::Text(v)
    }
}

impl From<Decimal> for RawAmount {
    fn from(v: Decimal) -> Self {
        RawAmount::Text(v.to_string())
    }
}

impl From<Money> for RawAmount {
    fn from(v: Money) -> Self {
        RawAmount::from(v.amount())
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// How a single field resolved during coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// A usable number.
    Present(Money),
    /// Null, absent or blank.
    Missing,
    /// A value was supplied but is not a number.
    Unparseable,
}

impl FieldValue {
    /// Resolves an optional raw amount.
    pub fn resolve(raw: Option<&RawAmount>) -> FieldValue {
        match raw {
            None => FieldValue::Missing,
            Some(raw) if raw.is_blank() => FieldValue::Missing,
            Some(raw) => match raw.to_money() {
                Some(money) => FieldValue::Present(money),
                None => FieldValue::Unparseable,
            },
        }
    }

    /// The value arithmetic uses: zero unless present.
    pub fn or_zero(&self) -> Money {
        match self {
            FieldValue::Present(money) => *money,
            FieldValue::Missing | FieldValue::Unparseable => Money::zero(),
        }
    }
}

// =============================================================================
// Economics Input
// =============================================================================

/// A snapshot of the sale fields needed to compute margins.
///
/// Deserializes directly from the store's camelCase record shape; unknown
/// fields are ignored so a whole sale record can be passed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_amount_ex_vat: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_cost: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_fees: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_costs: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introducer_commission: Option<RawAmount>,
}

impl EconomicsInput {
    /// An input with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field (builder style).
    pub fn with(mut self, field: EconomicsField, value: impl Into<RawAmount>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Returns the raw value of a field.
    pub fn get(&self, field: EconomicsField) -> Option<&RawAmount> {
        match field {
            EconomicsField::SaleAmountExVat => self.sale_amount_ex_vat.as_ref(),
            EconomicsField::BuyPrice => self.buy_price.as_ref(),
            EconomicsField::ShippingCost => self.shipping_cost.as_ref(),
            EconomicsField::CardFees => self.card_fees.as_ref(),
            EconomicsField::DirectCosts => self.direct_costs.as_ref(),
            EconomicsField::IntroducerCommission => self.introducer_commission.as_ref(),
        }
    }

    /// Replaces the raw value of a field.
    pub fn set(&mut self, field: EconomicsField, value: Option<RawAmount>) {
        let slot = match field {
            EconomicsField::SaleAmountExVat => &mut self.sale_amount_ex_vat,
            EconomicsField::BuyPrice => &mut self.buy_price,
            EconomicsField::ShippingCost => &mut self.shipping_cost,
            EconomicsField::CardFees => &mut self.card_fees,
            EconomicsField::DirectCosts => &mut self.direct_costs,
            EconomicsField::IntroducerCommission => &mut self.introducer_commission,
        };
        *slot = value;
    }

    /// The raw value of a field as text, for storage.
    pub fn raw_text(&self, field: EconomicsField) -> Option<String> {
        self.get(field).map(RawAmount::to_text)
    }

    /// Resolves a single field.
    pub fn resolve(&self, field: EconomicsField) -> FieldValue {
        FieldValue::resolve(self.get(field))
    }
}

// =============================================================================
// Margin Result
// =============================================================================

/// Output of [`calculate_margins`].
///
/// Not persisted by the calculator; callers store `gross_margin` and
/// `commissionable_margin` on the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MarginResult {
    pub gross_margin: Money,
    pub commissionable_margin: Money,
    /// Every input field mapped to the value actually used.
    pub breakdown: BTreeMap<EconomicsField, Money>,
    /// Fields that were null, absent or blank (used as zero).
    pub missing_fields: Vec<EconomicsField>,
    /// Fields that held something other than a number (used as zero).
    pub unparseable_fields: Vec<EconomicsField>,
}

impl MarginResult {
    /// The value used for `field`.
    pub fn value_of(&self, field: EconomicsField) -> Money {
        self.breakdown.get(&field).copied().unwrap_or_default()
    }

    /// True when neither revenue nor cost basis had a usable value, so the
    /// margin says nothing about the sale.
    pub fn is_degenerate(&self) -> bool {
        [EconomicsField::SaleAmountExVat, EconomicsField::BuyPrice]
            .iter()
            .all(|field| !self.was_supplied(*field))
    }

    /// True when every field had a usable value.
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty() && self.unparseable_fields.is_empty()
    }

    /// True when a required field (revenue or cost basis) was defaulted.
    pub fn is_incomplete(&self) -> bool {
        EconomicsField::ALL
            .iter()
            .any(|field| field.is_required() && !self.was_supplied(*field))
    }

    fn was_supplied(&self, field: EconomicsField) -> bool {
        !self.missing_fields.contains(&field) && !self.unparseable_fields.contains(&field)
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes gross and commissionable margin for a sale.
///
/// ## Contract
/// - Never fails: missing or malformed fields count as zero
/// - Pure: identical input yields identical output, breakdown included
/// - Exact: decimal arithmetic, no rounding, negative margins are kept
///
/// ## Example
/// ```rust
/// use salesos_core::economics::{calculate_margins, EconomicsField, EconomicsInput};
/// use salesos_core::money::Money;
///
/// let input = EconomicsInput::new()
///     .with(EconomicsField::SaleAmountExVat, 1250)
///     .with(EconomicsField::BuyPrice, "900.00")
///     .with(EconomicsField::ShippingCost, 25)
///     .with(EconomicsField::IntroducerCommission, 50);
///
/// let result = calculate_margins(&input);
/// assert_eq!(result.gross_margin, Money::from_major(325));
/// assert_eq!(result.commissionable_margin, Money::from_major(275));
/// assert!(result.missing_fields.len() == 2); // cardFees, directCosts
/// ```
pub fn calculate_margins(input: &EconomicsInput) -> MarginResult {
    let mut breakdown = BTreeMap::new();
    let mut missing_fields = Vec::new();
    let mut unparseable_fields = Vec::new();

    for field in EconomicsField::ALL {
        let value = input.resolve(field);
        match value {
            FieldValue::Present(_) => {}
            FieldValue::Missing => missing_fields.push(field),
            FieldValue::Unparseable => unparseable_fields.push(field),
        }
        breakdown.insert(field, value.or_zero());
    }

    let used = |field: EconomicsField| breakdown.get(&field).copied().unwrap_or_default();

    let gross_margin = used(EconomicsField::SaleAmountExVat)
        - used(EconomicsField::BuyPrice)
        - used(EconomicsField::ShippingCost)
        - used(EconomicsField::CardFees)
        - used(EconomicsField::DirectCosts);

    let commissionable_margin = gross_margin - used(EconomicsField::IntroducerCommission);

    MarginResult {
        gross_margin,
        commissionable_margin,
        breakdown,
        missing_fields,
        unparseable_fields,
    }
}

/// Parses a JSON document (a whole sale record or just its economics
/// fields) and computes its margins.
///
/// Only structural JSON errors fail; field values never do.
pub fn calculate_margins_from_json(json: &str) -> Result<MarginResult, serde_json::Error> {
    let input: EconomicsInput = serde_json::from_str(json)?;
    Ok(calculate_margins(&input))
}

/// Convenience for callers holding exact decimals already.
pub fn decimal_input(
    sale_amount_ex_vat: Decimal,
    buy_price: Decimal,
    shipping_cost: Decimal,
    card_fees: Decimal,
    direct_costs: Decimal,
    introducer_commission: Decimal,
) -> EconomicsInput {
    EconomicsInput::new()
        .with(EconomicsField::SaleAmountExVat, sale_amount_ex_vat)
        .with(EconomicsField::BuyPrice, buy_price)
        .with(EconomicsField::ShippingCost, shipping_cost)
        .with(EconomicsField::CardFees, card_fees)
        .with(EconomicsField::DirectCosts, direct_costs)
        .with(EconomicsField::IntroducerCommission, introducer_commission)
}

impl FromStr for EconomicsField {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EconomicsField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| crate::error::ValidationError::NotAllowed {
                field: "economics field".to_string(),
                allowed: EconomicsField::ALL
                    .iter()
                    .map(|f| f.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
