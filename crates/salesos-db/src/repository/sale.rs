//! # Sale Repository
//!
//! Persistence for sales and their economics inputs.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Write Paths                                  │
//! │                                                                         │
//! │  insert()                 → inputs + margins from calculate_margins    │
//! │  update_inputs()          → inputs only, margins left stale            │
//! │  write_margins()          → margins only (reconciliation)              │
//! │  set_commission_locked()  → lock flag                                  │
//! │                                                                         │
//! │  Every update bumps `version` and requires the caller's               │
//! │  expected version:  WHERE id = ?1 AND version = ?N                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are stored as TEXT: inputs exactly as entered, margins as exact
//! decimals. A margin column that no longer holds a decimal reads back as
//! `None`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use salesos_core::economics::{calculate_margins, EconomicsField, EconomicsInput, RawAmount};
use salesos_core::money::Money;
use salesos_core::types::{NewSale, SaleRecord};
use salesos_core::validation::validate_new_sale;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = r#"
    id, sale_reference, sale_date, introducer_id,
    sale_amount_ex_vat, buy_price, shipping_cost, card_fees, direct_costs,
    introducer_commission,
    gross_margin, commissionable_margin,
    commission_locked, created_at, updated_at, version
"#;

/// Column holding each economics input.
fn input_column(field: EconomicsField) -> &'static str {
    match field {
        EconomicsField::SaleAmountExVat => "sale_amount_ex_vat",
        EconomicsField::BuyPrice => "buy_price",
        EconomicsField::ShippingCost => "shipping_cost",
        EconomicsField::CardFees => "card_fees",
        EconomicsField::DirectCosts => "direct_costs",
        EconomicsField::IntroducerCommission => "introducer_commission",
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    sale_reference: String,
    sale_date: DateTime<Utc>,
    introducer_id: Option<String>,
    sale_amount_ex_vat: Option<String>,
    buy_price: Option<String>,
    shipping_cost: Option<String>,
    card_fees: Option<String>,
    direct_costs: Option<String>,
    introducer_commission: Option<String>,
    gross_margin: Option<String>,
    commissionable_margin: Option<String>,
    commission_locked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl SaleRow {
    /// Reads a stored margin. Text that is not a decimal (a legacy import's
    /// `''`, say) loads as absent, so reconciliation treats it as never
    /// computed and overwrites it.
    fn decode_margin(&self, column: &str, value: Option<&str>) -> Option<Money> {
        let raw = value?;
        match Decimal::from_str(raw.trim()) {
            Ok(amount) => Some(Money::new(amount)),
            Err(_) => {
                warn!(id = %self.id, column, value = %raw, "Unreadable stored margin, treating as absent");
                None
            }
        }
    }
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        let gross_margin = row.decode_margin("gross_margin", row.gross_margin.as_deref());
        let commissionable_margin =
            row.decode_margin("commissionable_margin", row.commissionable_margin.as_deref());

        // Inputs go back to the calculator as text, whatever was stored.
        let mut inputs = EconomicsInput::new();
        for (field, value) in [
            (EconomicsField::SaleAmountExVat, row.sale_amount_ex_vat),
            (EconomicsField::BuyPrice, row.buy_price),
            (EconomicsField::ShippingCost, row.shipping_cost),
            (EconomicsField::CardFees, row.card_fees),
            (EconomicsField::DirectCosts, row.direct_costs),
            (EconomicsField::IntroducerCommission, row.introducer_commission),
        ] {
            inputs.set(field, value.map(RawAmount::Text));
        }

        SaleRecord {
            id: row.id,
            sale_reference: row.sale_reference,
            sale_date: row.sale_date,
            introducer_id: row.introducer_id,
            inputs,
            gross_margin,
            commissionable_margin,
            commission_locked: row.commission_locked,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

fn money_text(money: Money) -> String {
    money.amount().to_string()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.sales();
/// let sale = repo.insert(&new_sale).await?;
/// let loaded = repo.get_by_id(&sale.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a new sale.
    ///
    /// Margins are computed by [`calculate_margins`] before the row is
    /// written, so a fresh sale never starts out drifted.
    pub async fn insert(&self, sale: &NewSale) -> DbResult<SaleRecord> {
        validate_new_sale(sale)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let margins = calculate_margins(&sale.inputs);

        debug!(
            id = %id,
            sale_reference = %sale.sale_reference,
            gross_margin = %margins.gross_margin,
            "Inserting sale"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_reference, sale_date, introducer_id,
                sale_amount_ex_vat, buy_price, shipping_cost, card_fees, direct_costs,
                introducer_commission,
                gross_margin, commissionable_margin,
                commission_locked, created_at, updated_at, version
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10,
                ?11, ?12,
                0, ?13, ?13, 1
            )
            "#,
        )
        .bind(&id)
        .bind(sale.sale_reference.trim())
        .bind(sale.sale_date)
        .bind(&sale.introducer_id)
        .bind(sale.inputs.raw_text(EconomicsField::SaleAmountExVat))
        .bind(sale.inputs.raw_text(EconomicsField::BuyPrice))
        .bind(sale.inputs.raw_text(EconomicsField::ShippingCost))
        .bind(sale.inputs.raw_text(EconomicsField::CardFees))
        .bind(sale.inputs.raw_text(EconomicsField::DirectCosts))
        .bind(sale.inputs.raw_text(EconomicsField::IntroducerCommission))
        .bind(money_text(margins.gross_margin))
        .bind(money_text(margins.commissionable_margin))
        .bind(now)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            return Err(match DbError::from(err) {
                DbError::UniqueViolation { field, .. } => {
                    DbError::duplicate(field, sale.sale_reference.trim())
                }
                other => other,
            });
        }

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("sale {} vanished after insert", id)))
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SaleRecord::from))
    }

    /// Gets a sale by its reference (invoice number).
    pub async fn get_by_reference(&self, sale_reference: &str) -> DbResult<Option<SaleRecord>> {
        let sql = format!("SELECT {} FROM sales WHERE sale_reference = ?1", SALE_COLUMNS);

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(sale_reference.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SaleRecord::from))
    }

    /// All sale IDs, oldest sale first.
    pub async fn list_ids(&self) -> DbResult<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM sales ORDER BY sale_date, created_at, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    /// Number of sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Replaces a sale's economics inputs.
    ///
    /// Stored margins are NOT recomputed here; they go stale until the sale
    /// is reconciled. Returns the new version.
    pub async fn update_inputs(
        &self,
        id: &str,
        inputs: &EconomicsInput,
        expected_version: i64,
    ) -> DbResult<i64> {
        debug!(id = %id, expected_version, "Updating sale inputs");

        let assignments: Vec<String> = EconomicsField::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{} = ?{}", input_column(*field), i + 4))
            .collect();
        let sql = format!(
            "UPDATE sales SET {}, updated_at = ?3, version = version + 1 \
             WHERE id = ?1 AND version = ?2",
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(Utc::now());
        for field in EconomicsField::ALL {
            query = query.bind(inputs.raw_text(field));
        }

        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(self.conflict_or_missing(id, expected_version).await);
        }

        Ok(expected_version + 1)
    }

    /// Overwrites the stored margins. Returns the new version.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] if the sale doesn't exist
    /// - [`DbError::WriteConflict`] if the version moved since it was read
    pub async fn write_margins(
        &self,
        id: &str,
        gross_margin: Money,
        commissionable_margin: Money,
        expected_version: i64,
    ) -> DbResult<i64> {
        debug!(
            id = %id,
            gross_margin = %gross_margin,
            commissionable_margin = %commissionable_margin,
            expected_version,
            "Writing margins"
        );

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                gross_margin = ?3,
                commissionable_margin = ?4,
                updated_at = ?5,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(money_text(gross_margin))
        .bind(money_text(commissionable_margin))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.conflict_or_missing(id, expected_version).await);
        }

        Ok(expected_version + 1)
    }

    /// Locks or unlocks commission on a sale.
    ///
    /// Bumps `version`, so a reconciliation that read the sale before the
    /// lock fails with a conflict instead of moving locked margins.
    pub async fn set_commission_locked(&self, id: &str, locked: bool) -> DbResult<()> {
        debug!(id = %id, locked, "Setting commission lock");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                commission_locked = ?2,
                updated_at = ?3,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(locked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Tells a stale version apart from a missing row after a 0-row update.
    async fn conflict_or_missing(&self, id: &str, expected_version: i64) -> DbError {
        let current: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM sales WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(_)) => DbError::WriteConflict {
                id: id.to_string(),
                expected_version,
            },
            Ok(None) => DbError::not_found("Sale", id),
            Err(err) => err.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use rust_decimal_macros::dec;

    async fn setup() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    fn new_sale(reference: &str, inputs: EconomicsInput) -> NewSale {
        NewSale {
            sale_reference: reference.to_string(),
            sale_date: Utc::now(),
            introducer_id: None,
            inputs,
        }
    }

    #[tokio::test]
    async fn test_insert_computes_margins() {
        let repo = setup().await;
        let inputs = EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, 100)
            .with(EconomicsField::BuyPrice, "40.50")
            .with(EconomicsField::IntroducerCommission, 5.5);

        let sale = repo.insert(&new_sale("INV-1", inputs)).await.unwrap();

        assert_eq!(sale.version, 1);
        assert_eq!(sale.gross_margin, Some(Money::new(dec!(59.50))));
        assert_eq!(sale.commissionable_margin, Some(Money::new(dec!(54.00))));
        assert!(!sale.commission_locked);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inputs_are_stored_verbatim() {
        let repo = setup().await;
        let inputs = EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, "£1,250")
            .with(EconomicsField::BuyPrice, "TBC")
            .with(EconomicsField::ShippingCost, "");

        let sale = repo.insert(&new_sale("INV-2", inputs)).await.unwrap();
        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();

        assert_eq!(loaded.inputs.raw_text(EconomicsField::SaleAmountExVat), Some("£1,250".to_string()));
        assert_eq!(loaded.inputs.raw_text(EconomicsField::BuyPrice), Some("TBC".to_string()));
        assert_eq!(loaded.inputs.raw_text(EconomicsField::ShippingCost), Some(String::new()));
        assert_eq!(loaded.inputs.raw_text(EconomicsField::CardFees), None);
        assert_eq!(loaded.gross_margin, Some(Money::from_major(1250)));
        assert_eq!(loaded.recompute(), sale.recompute());
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let repo = setup().await;
        repo.insert(&new_sale("INV-3", EconomicsInput::new())).await.unwrap();

        let err = repo
            .insert(&new_sale("INV-3", EconomicsInput::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "INV-3"));
    }

    #[tokio::test]
    async fn test_invalid_sale_rejected() {
        let repo = setup().await;
        let err = repo.insert(&new_sale("", EconomicsInput::new())).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_update_inputs_leaves_margins_stale() {
        let repo = setup().await;
        let sale = repo
            .insert(&new_sale(
                "INV-4",
                EconomicsInput::new().with(EconomicsField::SaleAmountExVat, 100),
            ))
            .await
            .unwrap();

        let inputs = sale.inputs.clone().with(EconomicsField::BuyPrice, 40);
        let version = repo.update_inputs(&sale.id, &inputs, sale.version).await.unwrap();
        assert_eq!(version, 2);

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.gross_margin, Some(Money::from_major(100)));
        assert_eq!(loaded.recompute().gross_margin, Money::from_major(60));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let repo = setup().await;
        let sale = repo.insert(&new_sale("INV-5", EconomicsInput::new())).await.unwrap();

        repo.write_margins(&sale.id, Money::zero(), Money::zero(), 1)
            .await
            .unwrap();

        let err = repo
            .write_margins(&sale.id, Money::zero(), Money::zero(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::WriteConflict { expected_version: 1, .. }));

        let err = repo
            .write_margins("missing", Money::zero(), Money::zero(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_commission_lock_bumps_version() {
        let repo = setup().await;
        let sale = repo.insert(&new_sale("INV-6", EconomicsInput::new())).await.unwrap();

        repo.set_commission_locked(&sale.id, true).await.unwrap();

        let loaded = repo.get_by_reference("INV-6").await.unwrap().unwrap();
        assert!(loaded.commission_locked);
        assert_eq!(loaded.version, 2);

        let err = repo.set_commission_locked("missing", true).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_ids() {
        let repo = setup().await;
        assert!(repo.list_ids().await.unwrap().is_empty());

        let a = repo.insert(&new_sale("INV-7", EconomicsInput::new())).await.unwrap();
        let b = repo.insert(&new_sale("INV-8", EconomicsInput::new())).await.unwrap();

        let ids = repo.list_ids().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }

    #[tokio::test]
    async fn test_unreadable_margin_loads_as_absent() {
        let repo = setup().await;
        let inputs = EconomicsInput::new()
            .with(EconomicsField::SaleAmountExVat, 100)
            .with(EconomicsField::BuyPrice, 40);
        let sale = repo.insert(&new_sale("INV-9", inputs)).await.unwrap();

        sqlx::query("UPDATE sales SET gross_margin = '', commissionable_margin = 'n/a' WHERE id = ?1")
            .bind(&sale.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let loaded = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.gross_margin, None);
        assert_eq!(loaded.commissionable_margin, None);
        assert_eq!(loaded.version, sale.version);
    }
}
