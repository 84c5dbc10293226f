//! # Repository Module
//!
//! Database repositories for Sales OS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MarginFixer / dashboard handler                                        │
//! │       │                                                                 │
//! │       │  db.sales().get_by_id(id)                                       │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── insert / get_by_id / get_by_reference / list_ids / count          │
//! │  ├── update_inputs       (version-checked)                             │
//! │  ├── write_margins       (version-checked)                             │
//! │  └── set_commission_locked                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sales and their margins
//! - [`IntroducerRepository`](introducer::IntroducerRepository) - Referring parties

pub mod introducer;
pub mod sale;
