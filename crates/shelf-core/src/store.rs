//! # Product Store
//!
//! The persistence seam between the pure ledger and whatever keeps product
//! documents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockLedger ──save(&Product)──► dyn ProductStore                       │
//! │                                      ├── MemoryProductStore (here)      │
//! │                                      └── ProductRepository (shelf-db)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A save replaces the whole document, nested variations and batches
//! included. There is no optimistic concurrency: the last writer wins.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::Product;

/// Keeps whole product documents.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts or replaces the product document.
    async fn save(&self, product: &Product) -> Result<(), StoreError>;

    /// Loads a product document by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
impl<S: ProductStore + ?Sized> ProductStore for std::sync::Arc<S> {
    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        (**self).save(product).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        (**self).find_by_id(id).await
    }
}

/// In-process store keyed by product id.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: Mutex<HashMap<String, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products.
    pub fn len(&self) -> usize {
        self.products.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn save(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self
            .products
            .lock()
            .map_err(|_| StoreError::from("product store lock poisoned"))?;
        products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let products = self
            .products
            .lock()
            .map_err(|_| StoreError::from("product store lock poisoned"))?;
        Ok(products.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_replaces_document() {
        let store = MemoryProductStore::new();
        let mut product = Product::new("Vinegar 1L", "Condiments", 4_500, 3_200, 5, Utc::now());

        store.save(&product).await.unwrap();
        product.stocks = 12;
        store.save(&product).await.unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.find_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.stocks, 12);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }
}
