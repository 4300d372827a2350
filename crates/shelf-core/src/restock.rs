//! # Restock Workflow
//!
//! Receiving new stock for a product: bump the running counters, allocate
//! one batch per stocked entity, save once, and hand back audit entries.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Restock { product_quantity, variation_quantities, expiry }             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate (non-negative, variations exist, something to add)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each target with qty > 0:                                          │
//! │       stocks += qty                                                     │
//! │       batch = generate_batch_number(id, now, last_sequence, qty, expiry)│
//! │       apply_batch(...)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductStore::save(product)  (once)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<AuditEntry>  (one per batch, attributed to the Actor)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::audit::{Actor, AuditEntry};
use crate::batch::{generate_batch_number, last_sequence};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{apply_batch, StockLedger};
use crate::store::ProductStore;
use crate::types::{BatchHolder, Product};

/// Quantities received for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Restock {
    /// Used only when the product has no variations.
    pub product_quantity: i64,

    /// `(variation_id, quantity)`; zero quantities are skipped.
    pub variation_quantities: Vec<(String, i64)>,

    /// Expiry applied to every batch in this delivery.
    #[ts(as = "Option<String>")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Restock {
    /// Delivery for a product without variations.
    pub fn product(quantity: i64, expiry: Option<DateTime<Utc>>) -> Self {
        Restock {
            product_quantity: quantity,
            variation_quantities: Vec::new(),
            expiry,
        }
    }

    /// Delivery split across variations.
    pub fn variations(
        quantities: impl IntoIterator<Item = (String, i64)>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        Restock {
            product_quantity: 0,
            variation_quantities: quantities.into_iter().collect(),
            expiry,
        }
    }

    fn validate(&self, product: &Product) -> CoreResult<()> {
        let negative = |field: &str| {
            CoreError::from(ValidationError::MustNotBeNegative {
                field: field.to_string(),
            })
        };

        if self.product_quantity < 0 {
            return Err(negative("product_quantity"));
        }

        // a product with variations holds no stock of its own
        if self.product_quantity > 0 && product.has_variations() {
            return Err(CoreError::AmbiguousTarget {
                product_id: product.id.clone(),
            });
        }

        for (variation_id, quantity) in &self.variation_quantities {
            if *quantity < 0 {
                return Err(negative("variation_quantity"));
            }
            if product.variation(variation_id).is_none() {
                return Err(CoreError::variation_not_found(&product.id, variation_id));
            }
        }

        let adds_something = if product.has_variations() {
            self.variation_quantities.iter().any(|(_, q)| *q > 0)
        } else {
            self.product_quantity > 0
        };

        if !adds_something {
            return Err(ValidationError::MustBePositive {
                field: "restock quantity".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Bumps the counter and appends a freshly allocated batch.
fn receive<H: BatchHolder>(
    holder: &mut H,
    quantity: i64,
    restock: &Restock,
    now: DateTime<Utc>,
) -> CoreResult<String> {
    let batch = generate_batch_number(
        holder.holder_id(),
        now,
        last_sequence(holder.batches()),
        quantity,
        restock.expiry,
    )?;
    *holder.stocks_mut() += quantity;
    let batch_number = batch.batch_number.clone();
    holder.append_batch(batch);
    Ok(batch_number)
}

impl<S: ProductStore> StockLedger<S> {
    /// Receives a delivery for `product` and saves it.
    ///
    /// Validation happens before any mutation. Returns one audit entry per
    /// allocated batch, attributed to `actor`; recording them is up to the
    /// caller.
    pub async fn restock(
        &self,
        product: &mut Product,
        restock: &Restock,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<AuditEntry>> {
        restock.validate(product)?;

        let mut batch_numbers = Vec::new();

        if product.has_variations() {
            let product_id = product.id.clone();
            for (variation_id, quantity) in &restock.variation_quantities {
                if *quantity == 0 {
                    continue;
                }
                let variation = product
                    .variation_mut(variation_id)
                    .ok_or_else(|| CoreError::variation_not_found(&product_id, variation_id))?;
                batch_numbers.push(receive(variation, *quantity, restock, now)?);
            }
        } else {
            let batch = generate_batch_number(
                &product.id,
                now,
                last_sequence(&product.batch_number),
                restock.product_quantity,
                restock.expiry,
            )?;
            product.stocks += restock.product_quantity;
            batch_numbers.push(batch.batch_number.clone());
            apply_batch(product, None, batch)?;
        }

        product.updated_at = Some(now);
        self.persist(product).await?;

        info!(
            product_id = %product.id,
            batches = batch_numbers.len(),
            actor = %actor.email,
            "Restocked product"
        );

        Ok(batch_numbers
            .iter()
            .map(|number| AuditEntry::stock_added(actor, &product.id, number, now))
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::UserRole;
    use crate::ledger::tests::FailingStore;
    use crate::store::MemoryProductStore;
    use crate::types::Variation;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn admin() -> Actor {
        Actor {
            id: "admin-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: UserRole::Admin,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap()
    }

    fn shampoo() -> (Product, String, String) {
        let mut product = Product::new("Shampoo", "Personal Care", 0, 0, 5, now());
        let small = Variation::new("100ml", 8_500, 6_000, 5);
        let large = Variation::new("250ml", 16_000, 12_000, 5);
        let (s, l) = (small.id.clone(), large.id.clone());
        product.variations = vec![small, large];
        (product, s, l)
    }

    #[tokio::test]
    async fn test_restock_plain_product() {
        let store = Arc::new(MemoryProductStore::new());
        let ledger = StockLedger::new(Arc::clone(&store));
        let mut product = Product::new("Sugar 1kg", "Grocery", 7_500, 6_200, 10, now());
        product.stocks = 4;

        let expiry = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let entries = ledger
            .restock(&mut product, &Restock::product(20, Some(expiry)), &admin(), now())
            .await
            .unwrap();

        assert_eq!(product.stocks, 24);
        assert_eq!(product.batch_number.len(), 1);
        assert_eq!(product.batch_number[0].stock, 20);
        assert_eq!(product.expiry_date, Some(expiry));
        assert_eq!(product.batch_stock(), 20);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.ends_with(&product.batch_number[0].batch_number));
        assert_eq!(store.len(), 1);

        ledger
            .restock(&mut product, &Restock::product(6, None), &admin(), now())
            .await
            .unwrap();
        assert!(product.batch_number[1].batch_number.ends_with("-002"));
        assert_eq!(product.stocks, 30);
    }

    #[tokio::test]
    async fn test_restock_variations_skips_zero() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, small, large) = shampoo();

        let restock = Restock::variations([(small.clone(), 12), (large.clone(), 0)], None);
        let entries = ledger
            .restock(&mut product, &restock, &admin(), now())
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        let small_v = product.variation(&small).unwrap();
        assert_eq!(small_v.stocks, 12);
        assert_eq!(small_v.batch_number.len(), 1);
        assert!(product.variation(&large).unwrap().batch_number.is_empty());
        assert!(product.batch_number.is_empty());
        assert_eq!(product.stocks, 0);
    }

    #[tokio::test]
    async fn test_restock_rejects_bad_input_without_mutation() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, small, _) = shampoo();
        let before = product.clone();

        let unknown = Restock::variations([(small.clone(), 3), ("ghost".to_string(), 3)], None);
        let err = ledger.restock(&mut product, &unknown, &admin(), now()).await;
        assert!(matches!(err, Err(CoreError::VariationNotFound { .. })));

        let negative = Restock::variations([(small.clone(), -1)], None);
        let err = ledger.restock(&mut product, &negative, &admin(), now()).await;
        assert!(matches!(err, Err(CoreError::InvalidInput(_))));

        let nothing = Restock::variations([(small, 0)], None);
        let err = ledger.restock(&mut product, &nothing, &admin(), now()).await;
        assert!(matches!(err, Err(CoreError::InvalidInput(_))));

        assert_eq!(product, before);
    }

    #[tokio::test]
    async fn test_product_quantity_on_varied_product_is_rejected() {
        let ledger = StockLedger::new(MemoryProductStore::new());
        let (mut product, small, _) = shampoo();
        let before = product.clone();

        let mut restock = Restock::variations([(small, 4)], None);
        restock.product_quantity = 10;
        let err = ledger.restock(&mut product, &restock, &admin(), now()).await;

        assert!(matches!(err, Err(CoreError::AmbiguousTarget { .. })));
        assert_eq!(product, before);
        assert!(ledger.store().is_empty());
    }

    #[tokio::test]
    async fn test_restock_surfaces_store_failure() {
        let ledger = StockLedger::new(FailingStore);
        let mut product = Product::new("Salt", "Grocery", 2_000, 1_500, 5, now());

        let err = ledger
            .restock(&mut product, &Restock::product(5, None), &admin(), now())
            .await;

        assert!(matches!(err, Err(CoreError::Persistence(_))));
    }
}
