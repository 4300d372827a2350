//! # Transaction Repository
//!
//! Completed sales. The transaction (cashier and frozen lines included) is
//! kept as a JSON document next to a few indexed columns.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::Transaction;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a completed sale. Transactions are never updated.
    pub async fn insert(&self, tx: &Transaction) -> DbResult<()> {
        let document = serde_json::to_string(tx)?;

        debug!(
            id = %tx.id,
            cashier = %tx.cashier.id,
            subtotal = tx.subtotal.cents(),
            "Recording transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (id, cashier_id, subtotal_cents, document, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.cashier.id)
        .bind(tx.subtotal.cents())
        .bind(&document)
        .bind(tx.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(document.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    /// Newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        let documents: Vec<String> = sqlx::query_scalar(
            "SELECT document FROM transactions ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        decode_all(&documents)
    }

    /// Transactions whose UTC date falls within `[from, to]`, oldest first.
    ///
    /// Either bound may be open.
    pub async fn list_by_date_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Transaction>> {
        let start = from.map(start_of_day);
        // exclusive upper bound: midnight after `to`
        let end = to.and_then(|d| d.checked_add_days(Days::new(1))).map(start_of_day);

        debug!(?from, ?to, "Listing transactions by date");

        let documents: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT document FROM transactions
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        decode_all(&documents)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn decode_all(documents: &[String]) -> DbResult<Vec<Transaction>> {
    documents
        .iter()
        .map(|d| serde_json::from_str(d).map_err(DbError::from))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
