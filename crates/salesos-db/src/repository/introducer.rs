//! # Introducer Repository
//!
//! Referring parties a sale can be linked to. Sales reference them by
//! foreign key, so an introducer must exist before a sale names it.

use rust_decimal::Decimal;
use salesos_core::types::Introducer;
use salesos_core::validation::{validate_percent, validate_uuid};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct IntroducerRow {
    id: String,
    name: String,
    commission_percent: String,
}

impl TryFrom<IntroducerRow> for Introducer {
    type Error = DbError;

    fn try_from(row: IntroducerRow) -> DbResult<Self> {
        let commission_percent =
            Decimal::from_str(&row.commission_percent).map_err(|_| DbError::CorruptValue {
                id: row.id.clone(),
                column: "commission_percent".to_string(),
                value: row.commission_percent.clone(),
            })?;

        Ok(Introducer {
            id: row.id,
            name: row.name,
            commission_percent,
        })
    }
}

/// Repository for introducer database operations.
#[derive(Debug, Clone)]
pub struct IntroducerRepository {
    pool: SqlitePool,
}

impl IntroducerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        IntroducerRepository { pool }
    }

    /// Inserts an introducer after checking its id and percentage.
    pub async fn insert(&self, introducer: &Introducer) -> DbResult<()> {
        validate_uuid("id", &introducer.id)?;
        validate_percent("commission_percent", introducer.commission_percent)?;

        debug!(id = %introducer.id, name = %introducer.name, "Inserting introducer");

        sqlx::query("INSERT INTO introducers (id, name, commission_percent) VALUES (?1, ?2, ?3)")
            .bind(&introducer.id)
            .bind(introducer.name.trim())
            .bind(introducer.commission_percent.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets an introducer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Introducer>> {
        let row: Option<IntroducerRow> =
            sqlx::query_as("SELECT id, name, commission_percent FROM introducers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Introducer::try_from).transpose()
    }
}
