//! # Stock Ledger
//!
//! Appends batches to a product or one of its variations and persists the
//! result.
//!
//! ## Target Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  variation_id     product.variations     target                         │
//! │  ────────────     ──────────────────     ──────────────────────────     │
//! │  Some(id)         contains id            that variation                 │
//! │  Some(id)         does not contain id    VariationNotFound              │
//! │  None             empty                  the product itself             │
//! │  None             non-empty              AmbiguousTarget                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are raised before anything is mutated. The target's `expiry_date`
//! is recomputed from its own batches after the append.
//!
//! ## Quantity Accounting
//! The ledger records batches; it does not touch the running `stocks`
//! counters. Callers that add stock increment those themselves (see
//! [`restock`](crate::restock), which does both in one place).

use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::store::ProductStore;
use crate::types::{Batch, BatchHolder, Product};

/// Applies a batch to the resolved target without persisting.
///
/// Use this to stage several additions before a single save.
pub fn apply_batch(product: &mut Product, variation_id: Option<&str>, batch: Batch) -> CoreResult<()> {
    match variation_id {
        Some(variation_id) => match product.variations.iter_mut().find(|v| v.id == variation_id) {
            Some(variation) => {
                debug!(
                    product_id = %product.id,
                    variation_id = %variation_id,
                    batch_number = %batch.batch_number,
                    "Appending batch to variation"
                );
                variation.append_batch(batch);
                Ok(())
            }
            None => Err(CoreError::variation_not_found(&product.id, variation_id)),
        },
        None if product.has_variations() => Err(CoreError::AmbiguousTarget {
            product_id: product.id.clone(),
        }),
        None => {
            debug!(
                product_id = %product.id,
                batch_number = %batch.batch_number,
                "Appending batch to product"
            );
            product.append_batch(batch);
            Ok(())
        }
    }
}

/// Applies stock additions and saves them through a [`ProductStore`].
#[derive(Debug, Clone)]
pub struct StockLedger<S> {
    store: S,
}

impl<S: ProductStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        StockLedger { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends `batch` to the product or the given variation, then saves the
    /// whole product.
    ///
    /// ## Errors
    /// - `AmbiguousTarget` / `VariationNotFound`: nothing was mutated.
    /// - `Persistence`: the in-memory product already carries the batch; the
    ///   save is not retried.
    pub async fn add_stock_to_entity(
        &self,
        product: &mut Product,
        variation_id: Option<&str>,
        batch: Batch,
    ) -> CoreResult<()> {
        apply_batch(product, variation_id, batch)?;
        self.persist(product).await
    }

    pub(crate) async fn persist(&self, product: &Product) -> CoreResult<()> {
        self.store.save(product).await.map_err(|err| {
            warn!(product_id = %product.id, error = %err, "Failed to save product");
            CoreError::Persistence(err)
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::batch::{earliest_expiry, generate_batch_number, last_sequence};
    use crate::error::StoreError;
    use crate::store::MemoryProductStore;
    use crate::types::Variation;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    /// Store whose saves always fail.
    pub(crate) struct FailingStore;

    #[async_trait]
    impl ProductStore for FailingStore {
        async fn save(&self, _product: &Product) -> Result<(), StoreError> {
            Err("connection reset".into())
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<Product>, StoreError> {
            Ok(None)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    fn plain_product() -> Product {
        Product::new("Cooking Oil 1L", "Grocery", 9_800, 7_900, 10, day(2024, 1, 1))
    }

    fn product_with_variation() -> (Product, String) {
        let mut product = Product::new("Shampoo", "Personal Care", 0, 0, 5, day(2024, 1, 1));
        let variation = Variation::new("100ml", 8_500, 6_000, 5);
        let id = variation.id.clone();
        product.variations.push(variation);
        (product, id)
    }

    #[tokio::test]
    async fn test_variation_receives_batch() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, variation_id) = product_with_variation();
        let before = product.clone();

        let expiry = day(2024, 12, 31);
        let batch = generate_batch_number(&variation_id, day(2024, 2, 1), 0, 24, Some(expiry)).unwrap();
        ledger
            .add_stock_to_entity(&mut product, Some(&variation_id), batch)
            .await
            .unwrap();

        let variation = product.variation(&variation_id).unwrap();
        assert_eq!(variation.batch_number.len(), 1);
        assert_eq!(variation.expiry_date, earliest_expiry(&variation.batch_number));
        assert_eq!(variation.expiry_date, Some(expiry));

        assert_eq!(product.stocks, before.stocks);
        assert_eq!(product.batch_number, before.batch_number);

        let saved = ledger.store().find_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(saved, product);
    }

    #[tokio::test]
    async fn test_variation_expiry_tracks_earliest() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, variation_id) = product_with_variation();

        for expiry in [Some(day(2024, 9, 1)), None, Some(day(2024, 6, 1))] {
            let seq = last_sequence(&product.variation(&variation_id).unwrap().batch_number);
            let batch = generate_batch_number(&variation_id, day(2024, 2, 1), seq, 5, expiry).unwrap();
            ledger
                .add_stock_to_entity(&mut product, Some(&variation_id), batch)
                .await
                .unwrap();
        }

        let variation = product.variation(&variation_id).unwrap();
        assert_eq!(variation.batch_number.len(), 3);
        assert_eq!(variation.expiry_date, Some(day(2024, 6, 1)));
        assert!(variation.batch_number[2].batch_number.ends_with("-003"));
    }

    #[tokio::test]
    async fn test_ambiguous_target_does_not_mutate() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, _) = product_with_variation();
        let before = product.clone();

        let batch = generate_batch_number(&product.id, day(2024, 2, 1), 0, 10, None).unwrap();
        let result = ledger.add_stock_to_entity(&mut product, None, batch).await;

        assert!(matches!(result, Err(CoreError::AmbiguousTarget { .. })));
        assert_eq!(product, before);
        assert!(ledger.store().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_variation_does_not_mutate() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, _) = product_with_variation();
        let before = product.clone();

        let batch = generate_batch_number("ghost", day(2024, 2, 1), 0, 10, None).unwrap();
        let result = ledger
            .add_stock_to_entity(&mut product, Some("ghost"), batch)
            .await;

        assert!(matches!(result, Err(CoreError::VariationNotFound { .. })));
        assert_eq!(product, before);
        assert!(ledger.store().is_empty());
    }

    #[tokio::test]
    async fn test_product_without_variations_sequence() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let mut product = plain_product();

        let first = generate_batch_number(&product.id, day(2024, 1, 15), 0, 50, None).unwrap();
        ledger.add_stock_to_entity(&mut product, None, first).await.unwrap();

        assert_eq!(product.batch_number.len(), 1);
        let stored = &product.batch_number[0];
        assert_eq!(stored.stock, 50);
        assert_eq!(stored.batch_expiry, None);
        assert!(stored.batch_number.ends_with("-20240115-001"));
        assert_eq!(product.expiry_date, None);

        let second = generate_batch_number(&product.id, day(2024, 1, 15), 1, 20, None).unwrap();
        ledger.add_stock_to_entity(&mut product, None, second).await.unwrap();

        assert_eq!(product.batch_number.len(), 2);
        assert!(product.batch_number[1].batch_number.ends_with("-002"));
        // the ledger does not touch running totals
        assert_eq!(product.stocks, 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let ledger = StockLedger::new(FailingStore);
        let mut product = plain_product();

        let batch = generate_batch_number(&product.id, day(2024, 1, 15), 0, 5, None).unwrap();
        let err = ledger
            .add_stock_to_entity(&mut product, None, batch)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(err.to_string(), "Persistence failed: connection reset");
        assert_eq!(product.batch_number.len(), 1);
    }
}
