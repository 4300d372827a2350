//! # Audit Log Repository
//!
//! Append-only storage for [`AuditEntry`] records.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::AuditEntry;

#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

/// Row shape of `audit_log`; enums are stored as their snake_case names.
#[derive(Debug, FromRow)]
struct AuditRow {
    id: String,
    user_id: String,
    user_name: String,
    email: String,
    role: String,
    action: String,
    component: String,
    message: String,
    details: String,
    product_id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: row.id,
            email: row.email,
            role: row.role.parse()?,
            action: row.action.parse()?,
            component: row.component.parse()?,
            message: row.message,
            product_id: row.product_id,
            user_name: row.user_name,
            user_id: row.user_id,
            details: row.details,
            timestamp: row.timestamp,
        })
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO audit_log (
        id, user_id, user_name, email, role, action, component,
        message, details, product_id, timestamp
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

const SELECT_COLUMNS: &str = "SELECT id, user_id, user_name, email, role, action, component, \
     message, details, product_id, timestamp FROM audit_log";

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    pub async fn record(&self, entry: &AuditEntry) -> DbResult<()> {
        debug!(
            id = %entry.id,
            component = entry.component.as_str(),
            user = %entry.user_id,
            "Recording audit entry"
        );

        sqlx::query(INSERT_SQL)
            .bind(&entry.id)
            .bind(&entry.user_id)
            .bind(&entry.user_name)
            .bind(&entry.email)
            .bind(entry.role.as_str())
            .bind(entry.action.as_str())
            .bind(entry.component.as_str())
            .bind(&entry.message)
            .bind(&entry.details)
            .bind(&entry.product_id)
            .bind(entry.timestamp)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records several entries in one database transaction.
    pub async fn record_all(&self, entries: &[AuditEntry]) -> DbResult<()> {
        let mut db_tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(INSERT_SQL)
                .bind(&entry.id)
                .bind(&entry.user_id)
                .bind(&entry.user_name)
                .bind(&entry.email)
                .bind(entry.role.as_str())
                .bind(entry.action.as_str())
                .bind(entry.component.as_str())
                .bind(&entry.message)
                .bind(&entry.details)
                .bind(&entry.product_id)
                .bind(entry.timestamp)
                .execute(&mut *db_tx)
                .await?;
        }

        db_tx.commit().await?;
        debug!(count = entries.len(), "Recorded audit entries");
        Ok(())
    }

    /// Newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY timestamp DESC LIMIT ?1"))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    /// History of one product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<AuditEntry>> {
        let rows: Vec<AuditRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE product_id = ?1 ORDER BY timestamp ASC"))
                .bind(product_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use shelf_core::{Actor, AuditAction, UserRole};

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            name: "Rosa".to_string(),
            email: "rosa@example.com".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.audit_log();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let first = AuditEntry::stock_added(&admin(), "p-1", "111111-aaaa-20240301-001", t0);
        let second = AuditEntry::stock_added(
            &admin(),
            "p-1",
            "222222-aaaa-20240301-002",
            t0 + Duration::minutes(5),
        );
        let sale = AuditEntry::order_confirmed(&admin(), t0 + Duration::minutes(10));

        repo.record(&first).await.unwrap();
        repo.record_all(&[second.clone(), sale.clone()]).await.unwrap();

        let history = repo.list_for_product("p-1").await.unwrap();
        assert_eq!(history, vec![first, second]);

        let recent = repo.list_recent(1).await.unwrap();
        assert_eq!(recent, vec![sale]);
        assert_eq!(recent[0].action, AuditAction::Create);
    }
}
