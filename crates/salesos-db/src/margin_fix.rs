//! # Margin Fixer
//!
//! Repairs stored margins that no longer match their sale's inputs.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     fix_margin(sale_id)                                 │
//! │                                                                         │
//! │  get_by_id ──► None ──────────────────────────► DbError::NotFound      │
//! │     │                                                                   │
//! │     ├── commission_locked ────────────────────► DbError::CommissionLocked│
//! │     ▼                                                                   │
//! │  calculate_margins(inputs) ──► reconcile(stored, fresh, tolerance)     │
//! │     │                                                                   │
//! │     ├── no drift ──► report { updated: false }                         │
//! │     ├── dry run  ──► report { updated: false, dry_run: true }          │
//! │     └── drift    ──► write_margins(.., version) ──► report { updated } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write is guarded by the version read at the top, so an edit that
//! lands mid-flight surfaces as [`DbError::WriteConflict`] rather than being
//! silently overwritten with margins from the old inputs.

use salesos_core::completeness::{assess_with_introducer, CompletenessStatus};
use salesos_core::economics::EconomicsField;
use salesos_core::reconcile::{reconcile, FieldDrift, MarginField, ReconciliationOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReconcileConfig;
use crate::error::{DbError, DbResult};
use crate::repository::sale::SaleRepository;

// =============================================================================
// Reports
// =============================================================================

/// What reconciling one sale found and did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixMarginReport {
    pub sale_id: String,
    pub sale_reference: String,
    #[serde(flatten)]
    pub outcome: ReconciliationOutcome,
    /// True only if new margins were written.
    pub updated: bool,
    pub dry_run: bool,
    pub completeness: CompletenessStatus,
    /// Inputs the user should fill in for the margin to mean something.
    pub fields_to_prompt: Vec<EconomicsField>,
}

impl FixMarginReport {
    pub fn needs_update(&self) -> bool {
        self.outcome.needs_update()
    }

    /// One-line human summary.
    pub fn message(&self) -> String {
        if !self.needs_update() {
            return "No changes needed".to_string();
        }

        let changes: Vec<String> = self.outcome.changes().map(describe_drift).collect();
        let verb = if self.updated { "Updated" } else { "Would update" };
        format!("{}: {}", verb, changes.join("; "))
    }
}

fn describe_drift(drift: &FieldDrift) -> String {
    let name = match drift.field {
        MarginField::GrossMargin => "gross margin",
        MarginField::CommissionableMargin => "commissionable margin",
    };
    match (drift.before, drift.delta) {
        (Some(before), Some(delta)) => {
            format!("{} {} -> {} (delta {})", name, before, drift.after, delta)
        }
        _ => format!("{} (not computed) -> {}", name, drift.after),
    }
}

/// A sale a batch run could not reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixFailure {
    pub sale_id: String,
    pub error: String,
}

/// Totals from [`MarginFixer::fix_all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSummary {
    /// Sales reconciled without error.
    pub checked: usize,
    /// Checked sales whose stored margins had drifted.
    pub drifted: usize,
    /// Drifted sales whose margins were written.
    pub updated: usize,
    /// Checked sales already within tolerance.
    pub unchanged: usize,
    /// Locked or vanished sales.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FixFailure>,
    /// Reports for every drifted sale.
    pub changes: Vec<FixMarginReport>,
}

impl FixSummary {
    fn record(&mut self, report: FixMarginReport) {
        self.checked += 1;
        if report.needs_update() {
            self.drifted += 1;
            if report.updated {
                self.updated += 1;
            }
            self.changes.push(report);
        } else {
            self.unchanged += 1;
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

// =============================================================================
// Fixer
// =============================================================================

/// Recomputes and, when they drift, rewrites stored margins.
#[derive(Debug, Clone)]
pub struct MarginFixer {
    sales: SaleRepository,
    config: ReconcileConfig,
}

impl MarginFixer {
    pub fn new(sales: SaleRepository, config: ReconcileConfig) -> Self {
        MarginFixer { sales, config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconciles a single sale.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] if no sale has this id
    /// - [`DbError::CommissionLocked`] if commission is locked for payout
    /// - [`DbError::WriteConflict`] if the sale changed while being fixed
    pub async fn fix_margin(&self, sale_id: &str) -> DbResult<FixMarginReport> {
        let sale = self
            .sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if sale.commission_locked {
            debug!(sale_id = %sale.id, "Commission locked, not reconciling");
            return Err(DbError::CommissionLocked { id: sale.id });
        }

        let recomputed = sale.recompute();
        let outcome = reconcile(sale.stored_margins(), &recomputed, self.config.tolerance);
        let completeness = assess_with_introducer(&sale.inputs, sale.has_introducer());

        if completeness.status() == CompletenessStatus::Insufficient {
            warn!(
                sale_id = %sale.id,
                missing = ?completeness.fields_to_prompt(),
                "Margin computed from insufficient inputs"
            );
        }

        let updated = if outcome.needs_update() && !self.config.dry_run {
            self.sales
                .write_margins(
                    &sale.id,
                    recomputed.gross_margin,
                    recomputed.commissionable_margin,
                    sale.version,
                )
                .await?;
            true
        } else {
            false
        };

        let report = FixMarginReport {
            sale_id: sale.id,
            sale_reference: sale.sale_reference,
            outcome,
            updated,
            dry_run: self.config.dry_run,
            completeness: completeness.status(),
            fields_to_prompt: completeness.fields_to_prompt(),
        };

        if report.needs_update() {
            info!(
                sale_id = %report.sale_id,
                sale_reference = %report.sale_reference,
                updated = report.updated,
                "{}",
                report.message()
            );
        } else {
            debug!(sale_id = %report.sale_id, "No changes needed");
        }

        Ok(report)
    }

    /// Reconciles every sale, continuing past per-sale errors.
    pub async fn fix_all(&self) -> DbResult<FixSummary> {
        let ids = self.sales.list_ids().await?;
        info!(
            sales = ids.len(),
            tolerance = %self.config.tolerance,
            dry_run = self.config.dry_run,
            "Reconciling margins"
        );

        let mut summary = FixSummary::default();

        for id in ids {
            match self.fix_margin(&id).await {
                Ok(report) => summary.record(report),
                Err(err) if err.is_skippable() => {
                    debug!(sale_id = %id, error = %err, "Skipping sale");
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!(sale_id = %id, error = %err, "Failed to reconcile sale");
                    summary.failed += 1;
                    summary.failures.push(FixFailure {
                        sale_id: id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            checked = summary.checked,
            drifted = summary.drifted,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Reconciliation complete"
        );

        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use salesos_core::economics::EconomicsInput;
    use salesos_core::money::Money;
    use salesos_core::types::{NewSale, SaleRecord};
    use rust_decimal_macros::dec;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn insert(db: &Database, reference: &str, inputs: EconomicsInput) -> SaleRecord {
        db.sales()
            .insert(&NewSale {
                sale_reference: reference.to_string(),
                sale_date: Utc::now(),
                introducer_id: None,
                inputs,
            })
            .await
            .unwrap()
    }

    fn sixty_margin_inputs() -> EconomicsInput {
        EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, 100)
            .with(EconomicsField::BuyPrice, 40)
    }

    #[tokio::test]
    async fn test_fresh_sale_needs_no_changes() {
        let db = setup().await;
        let sale = insert(&db, "INV-1", sixty_margin_inputs()).await;

        let report = db
            .margin_fixer(ReconcileConfig::default())
            .fix_margin(&sale.id)
            .await
            .unwrap();

        assert!(!report.updated);
        assert_eq!(report.message(), "No changes needed");
        assert_eq!(report.completeness, CompletenessStatus::Partial);
    }

    #[tokio::test]
    async fn test_stale_margin_is_rewritten() {
        let db = setup().await;
        let sale = insert(&db, "INV-2", sixty_margin_inputs()).await;
        db.sales()
            .write_margins(&sale.id, Money::from_major(50), Money::from_major(50), sale.version)
            .await
            .unwrap();

        let report = db
            .margin_fixer(ReconcileConfig::default())
            .fix_margin(&sale.id)
            .await
            .unwrap();

        assert!(report.updated);
        assert_eq!(report.outcome.gross_margin.delta, Some(Money::from_major(10)));
        assert!(report.message().starts_with("Updated"));

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.gross_margin, Some(Money::from_major(60)));
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let db = setup().await;
        let sale = insert(&db, "INV-3", sixty_margin_inputs()).await;
        db.sales()
            .write_margins(&sale.id, Money::new(dec!(1)), Money::new(dec!(1)), 1)
            .await
            .unwrap();

        let fixer = db.margin_fixer(ReconcileConfig::default().with_dry_run(true));
        let report = fixer.fix_margin(&sale.id).await.unwrap();

        assert!(report.needs_update());
        assert!(!report.updated);
        assert!(report.message().starts_with("Would update"));

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.gross_margin, Some(Money::new(dec!(1))));
    }

    #[tokio::test]
    async fn test_locked_and_missing_sales() {
        let db = setup().await;
        let sale = insert(&db, "INV-4", sixty_margin_inputs()).await;
        db.sales().set_commission_locked(&sale.id, true).await.unwrap();

        let fixer = db.margin_fixer(ReconcileConfig::default());
        assert!(matches!(
            fixer.fix_margin(&sale.id).await,
            Err(DbError::CommissionLocked { .. })
        ));
        assert!(matches!(
            fixer.fix_margin("nope").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let db = setup().await;
        let sale = insert(&db, "INV-5", sixty_margin_inputs()).await;

        let report = db
            .margin_fixer(ReconcileConfig::default().with_dry_run(true))
            .fix_margin(&sale.id)
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["saleReference"], "INV-5");
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["updated"], false);
        assert!(json["fieldsToPrompt"].is_array());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = FixSummary::default();
        assert!(!summary.has_failures());
        summary.failed = 1;
        assert!(summary.has_failures());
    }
}
