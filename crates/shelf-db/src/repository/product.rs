//! # Product Repository
//!
//! Products are stored as whole JSON documents, variations and batches
//! nested inside.
//!
//! ## Table Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │  ───────────────────────────────────────────────────────────────────── │
//! │  id │ name │ category │ is_hidden │ document (JSON) │ created │ updated │
//! │                                        │                                │
//! │   copies of document fields ◄──────────┘  source of truth               │
//! │   (for ORDER BY / WHERE only)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every save replaces the document; the last writer wins.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::validation::validate_product;
use shelf_core::{Product, ProductStore, StoreError};

/// Repository for product documents.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// repo.save(&product).await?;
/// let loaded = repo.get_by_id(&product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts or replaces a product document.
    ///
    /// The document is validated first; nothing is written if it fails.
    pub async fn save(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;
        let document = serde_json::to_string(product)?;
        let updated_at = product.updated_at.unwrap_or(product.created_at);

        debug!(id = %product.id, bytes = document.len(), "Saving product document");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, is_hidden, document, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                is_hidden = excluded.is_hidden,
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.is_hidden)
        .bind(&document)
        .bind(product.created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        document.as_deref().map(decode).transpose()
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing product is an error.
    pub async fn require(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// All products ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let documents: Vec<String> =
            sqlx::query_scalar("SELECT document FROM products ORDER BY name COLLATE NOCASE, id")
                .fetch_all(&self.pool)
                .await?;

        debug!(count = documents.len(), "Listed products");
        documents.iter().map(|d| decode(d)).collect()
    }

    /// Products not hidden from the register, ordered by name.
    pub async fn list_visible(&self) -> DbResult<Vec<Product>> {
        let documents: Vec<String> = sqlx::query_scalar(
            "SELECT document FROM products WHERE is_hidden = 0 ORDER BY name COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        documents.iter().map(|d| decode(d)).collect()
    }

    /// Products in `category`, compared case-insensitively.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let documents: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT document FROM products
            WHERE category = ?1 COLLATE NOCASE
            ORDER BY name COLLATE NOCASE, id
            "#,
        )
        .bind(category.trim())
        .fetch_all(&self.pool)
        .await?;

        documents.iter().map(|d| decode(d)).collect()
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn decode(document: &str) -> DbResult<Product> {
    Ok(serde_json::from_str(document)?)
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        ProductRepository::save(self, product).await.map_err(StoreError::from)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.get_by_id(id).await.map_err(StoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use shelf_core::{
        generate_batch_number, last_sequence, CoreError, StockLedger, Variation,
    };

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(name: &str, category: &str) -> Product {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        Product::new(name, category, 4_500, 3_000, 5, now)
    }

    #[tokio::test]
    async fn test_save_and_reload_document() {
        let db = db().await;
        let repo = db.products();

        let mut shampoo = product("Shampoo", "Personal Care");
        let mut small = Variation::new("100ml", 8_500, 6_000, 5);
        let expiry = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        small.stocks = 24;
        shampoo.variations.push(small);
        let variation_id = shampoo.variations[0].id.clone();

        let ledger = StockLedger::new(repo.clone());
        let batch = generate_batch_number(&variation_id, Utc::now(), 0, 24, Some(expiry)).unwrap();
        ledger
            .add_stock_to_entity(&mut shampoo, Some(&variation_id), batch)
            .await
            .unwrap();

        let loaded = repo.require(&shampoo.id).await.unwrap();
        assert_eq!(loaded, shampoo);
        assert_eq!(loaded.variations[0].expiry_date, Some(expiry));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_null_expiry_is_written_explicitly() {
        let db = db().await;
        let repo = db.products();

        let mut oil = product("Cooking Oil", "Grocery");
        let batch = generate_batch_number(&oil.id, Utc::now(), last_sequence(&oil.batch_number), 10, None)
            .unwrap();
        StockLedger::new(repo.clone())
            .add_stock_to_entity(&mut oil, None, batch)
            .await
            .unwrap();

        let document: String = sqlx::query_scalar("SELECT document FROM products WHERE id = ?1")
            .bind(&oil.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(document.contains(r#""batchExpiry":null"#));
    }

    #[tokio::test]
    async fn test_document_missing_batch_expiry_is_rejected() {
        let db = db().await;
        let repo = db.products();
        let oil = product("Cooking Oil", "Grocery");
        repo.save(&oil).await.unwrap();

        let broken = serde_json::to_string(&oil)
            .unwrap()
            .replace(
                r#""batchNumber":[]"#,
                r#""batchNumber":[{"batchNumber":"1-a-20240101-001","stock":1,"addedDate":"2024-01-01T00:00:00Z"}]"#,
            );
        sqlx::query("UPDATE products SET document = ?1 WHERE id = ?2")
            .bind(&broken)
            .bind(&oil.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = repo.get_by_id(&oil.id).await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_upsert_and_listing() {
        let db = db().await;
        let repo = db.products();

        let mut rice = product("rice", "Grocery");
        let milk = product("Milk", "dairy");
        let mut secret = product("Bonus Item", "GROCERY");
        secret.is_hidden = true;

        for p in [&rice, &milk, &secret] {
            repo.save(p).await.unwrap();
        }
        rice.stocks = 40;
        repo.save(&rice).await.unwrap();

        let names: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Bonus Item", "Milk", "rice"]);

        assert_eq!(repo.list_visible().await.unwrap().len(), 2);
        assert_eq!(repo.list_by_category("grocery").await.unwrap().len(), 2);
        assert_eq!(repo.require(&rice.id).await.unwrap().stocks, 40);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_invalid_product_is_not_written() {
        let db = db().await;
        let repo = db.products();
        let nameless = product("   ", "Grocery");

        let err = repo.save(&nameless).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidDocument(_)));
        assert_eq!(repo.count().await.unwrap(), 0);

        let ledger = StockLedger::new(repo.clone());
        let mut nameless = nameless;
        let batch = generate_batch_number(&nameless.id, Utc::now(), 0, 1, None).unwrap();
        let err = ledger
            .add_stock_to_entity(&mut nameless, None, batch)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.products();
        let milk = product("Milk", "Dairy");
        repo.save(&milk).await.unwrap();

        repo.delete(&milk.id).await.unwrap();
        assert!(repo.get_by_id(&milk.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&milk.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
