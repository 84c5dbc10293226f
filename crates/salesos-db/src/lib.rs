//! # salesos-db: Sale Store and Margin Reconciliation
//!
//! SQLite persistence for Sales OS, plus the fix-margin flow that keeps
//! stored margins in line with the calculator in `salesos-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sales OS Data Flow                               │
//! │                                                                         │
//! │  fix-margins CLI / dashboard "Fix margin" button                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  salesos-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │ MarginFixer  │  │   │
//! │  │   │   (pool.rs)   │◄───│ SaleRepo      │◄───│ fix_margin   │  │   │
//! │  │   │  SqlitePool   │    │ IntroducerRepo│    │ fix_all      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │                                                     │          │   │
//! │  └─────────────────────────────────────────────────────┼──────────┘   │
//! │                                                        ▼              │
//! │                        salesos-core: calculate_margins + reconcile    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Sale and introducer repositories
//! - [`margin_fix`] - Stored-versus-recomputed margin repair
//! - [`config`] - Reconciliation settings from the environment
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use salesos_db::{Database, DbConfig, ReconcileConfig};
//!
//! let db = Database::new(DbConfig::new("salesos.db")).await?;
//! let report = db
//!     .margin_fixer(ReconcileConfig::from_env()?)
//!     .fix_margin(&sale_id)
//!     .await?;
//! println!("{}", report.message());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod margin_fix;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ReconcileConfig};
pub use error::{DbError, DbResult};
pub use margin_fix::{FixMarginReport, FixSummary, MarginFixer};
pub use pool::{Database, DbConfig};

pub use repository::introducer::IntroducerRepository;
pub use repository::sale::SaleRepository;
