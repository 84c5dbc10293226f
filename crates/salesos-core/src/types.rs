//! # Domain Types
//!
//! Core domain types used throughout Sales OS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │     SaleRecord      │   │   Introducer    │   │ CommissionBand  │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  id (UUID)          │   │  id (UUID)      │   │  band_type      │   │
//! │  │  sale_reference     │──►│  name           │   │  min_threshold  │   │
//! │  │  inputs (6 raw)     │   │  commission_%   │   │  max_threshold  │   │
//! │  │  gross_margin       │   └─────────────────┘   │  commission_%   │   │
//! │  │  commissionable_m.  │                         └─────────────────┘   │
//! │  │  version            │                                               │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every sale has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `sale_reference`: human-readable (invoice number), potentially mutable

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::economics::{calculate_margins, EconomicsInput, MarginResult};
use crate::money::Money;
use crate::reconcile::StoredMargins;

// =============================================================================
// Introducer
// =============================================================================

/// A referring party paid a share of the gross margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Introducer {
    pub id: String,
    pub name: String,
    /// Percentage of gross margin (0–100).
    #[ts(type = "string")]
    pub commission_percent: Decimal,
}

// =============================================================================
// Commission Band
// =============================================================================

/// A commissionable-margin range paying staff a fixed percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBand {
    /// e.g. "standard", "premium".
    pub band_type: String,
    /// Inclusive lower bound.
    pub min_threshold: Money,
    /// Exclusive upper bound; `None` is unbounded.
    pub max_threshold: Option<Money>,
    /// Percentage of commissionable margin paid to staff (0–100).
    #[ts(type = "string")]
    pub commission_percent: Decimal,
}

impl CommissionBand {
    /// Checks if `margin` falls in `[min_threshold, max_threshold)`.
    pub fn contains(&self, margin: Money) -> bool {
        margin >= self.min_threshold && self.max_threshold.map_or(true, |max| margin < max)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Data needed to record a new sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub sale_reference: String,
    pub sale_date: DateTime<Utc>,
    pub introducer_id: Option<String>,
    #[serde(flatten)]
    pub inputs: EconomicsInput,
}

/// A sale as persisted, with its stored (possibly stale) margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub sale_reference: String,
    pub sale_date: DateTime<Utc>,
    pub introducer_id: Option<String>,
    #[serde(flatten)]
    pub inputs: EconomicsInput,
    pub gross_margin: Option<Money>,
    pub commissionable_margin: Option<Money>,
    /// Once commission is locked for payout the margins must not move.
    pub commission_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every write (optimistic concurrency).
    pub version: i64,
}

impl SaleRecord {
    pub fn stored_margins(&self) -> StoredMargins {
        StoredMargins {
            gross_margin: self.gross_margin,
            commissionable_margin: self.commissionable_margin,
        }
    }

    /// Recomputes margins from the raw inputs.
    pub fn recompute(&self) -> MarginResult {
        calculate_margins(&self.inputs)
    }

    pub fn has_introducer(&self) -> bool {
        self.introducer_id.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
