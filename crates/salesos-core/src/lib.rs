//! # salesos-core: Pure Business Logic for Sales OS
//!
//! This crate holds the margin and commission engine behind the Sales OS
//! dashboard, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sales OS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard (pages, API handlers)                 │   │
//! │  │    Sale form ──► Completeness prompt ──► Fix-margin button     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ salesos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌──────────┐  │   │
//! │  │   │ economics │  │completeness│  │ reconcile │  │commission│  │   │
//! │  │   │  margins  │  │  missing   │  │   drift   │  │  bands   │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  salesos-db (Database Layer)                    │   │
//! │  │          Sale store, migrations, fix-margin reconciliation      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type over fixed-point decimals
//! - [`economics`] - `calculate_margins`, the only place margin math happens
//! - [`completeness`] - Which inputs are present before computing
//! - [`reconcile`] - Stored-versus-recomputed drift detection
//! - [`commission`] - Introducer commission and staff commission bands
//! - [`legacy`] - Margin resolution for imported spreadsheet trades
//! - [`types`] - Domain types (SaleRecord, Introducer, CommissionBand)
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use salesos_core::economics::{calculate_margins, EconomicsField, EconomicsInput};
//! use salesos_core::money::Money;
//!
//! let input = EconomicsInput::new()
//!     .with(EconomicsField::SaleAmountExVat, 100)
//!     .with(EconomicsField::BuyPrice, "40.50");
//!
//! let result = calculate_margins(&input);
//! assert_eq!(result.gross_margin, Money::from_cents(5950));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod completeness;
pub mod economics;
pub mod error;
pub mod legacy;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use commission::{introducer_commission, split_commission, CommissionBands, CommissionSplit};
pub use completeness::{assess_completeness, CompletenessReport, CompletenessStatus};
pub use economics::{calculate_margins, EconomicsField, EconomicsInput, MarginResult, RawAmount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconcile::{reconcile, ReconciliationOutcome, StoredMargins};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest magnitude (in pounds) accepted for a single input amount.
///
/// Anything above is treated as unparseable input rather than a real price.
pub const MAX_ABS_AMOUNT: i64 = 1_000_000_000_000;

/// Maximum length of a sale reference.
pub const MAX_SALE_REFERENCE_LEN: usize = 50;
