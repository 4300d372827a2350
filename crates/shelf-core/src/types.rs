//! # Domain Types
//!
//! Catalog types shared by every Shelf module.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────┐                         │
//! │  │    Product      │ 1    * │   Variation     │                         │
//! │  │  ─────────────  │───────►│  ─────────────  │                         │
//! │  │  id             │        │  id             │                         │
//! │  │  stocks         │        │  stocks         │                         │
//! │  │  batch_number[] │        │  batch_number[] │                         │
//! │  │  expiry_date    │        │  expiry_date    │                         │
//! │  └────────┬────────┘        └────────┬────────┘                         │
//! │           │ 1..*                     │ 1..*                             │
//! │           ▼                          ▼                                  │
//! │  ┌─────────────────────────────────────────────┐                        │
//! │  │  Batch (immutable once created)             │                        │
//! │  │  batch_number, stock, added_date,           │                        │
//! │  │  batch_expiry (explicit null = no expiry)   │                        │
//! │  └─────────────────────────────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A product owns its variations and its own batch list; a variation owns
//! its batch list. Once a product has variations, its own `stocks` and
//! `batch_number` stop being the source of truth for availability.
//!
//! ## Document Shape
//! Types serialize camelCase so a product is stored as one JSON document,
//! batches and variations nested inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::batch::earliest_expiry;
use crate::money::Money;

// =============================================================================
// Batch
// =============================================================================

/// A discrete addition of stock with its own identifier and optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Batch {
    /// `<random>-<entity suffix>-<YYYYMMDD>-<sequence>`.
    pub batch_number: String,

    /// Quantity added by this batch.
    pub stock: i64,

    /// When the stock was added.
    #[ts(as = "String")]
    pub added_date: DateTime<Utc>,

    /// Expiry of this batch. Always written; `null` means non-expiring.
    #[serde(deserialize_with = "required_expiry")]
    #[ts(as = "Option<String>")]
    pub batch_expiry: Option<DateTime<Utc>>,

    /// Deactivated batches still count as history but not as stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub is_active: Option<bool>,
}

impl Batch {
    /// Batches without an explicit flag are active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// `batchExpiry` must be present in a stored batch, even when `null`.
fn required_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer)
}

// =============================================================================
// Batch Holder
// =============================================================================

/// Anything that owns a batch list and a running stock counter.
///
/// Implemented by [`Product`] and [`Variation`] so the ledger and the restock
/// workflow treat both levels of the hierarchy the same way.
pub trait BatchHolder {
    /// Identifier encoded into this holder's batch numbers.
    fn holder_id(&self) -> &str;

    /// Batches in insertion (chronological) order.
    fn batches(&self) -> &[Batch];

    /// Running stock counter shown to cashiers.
    fn stocks_mut(&mut self) -> &mut i64;

    /// Appends a batch and re-derives the expiry rollup.
    fn append_batch(&mut self, batch: Batch);

    /// Sum of active batch quantities.
    ///
    /// Independent of the running `stocks` counter, which callers maintain
    /// separately; comparing the two exposes drift.
    fn batch_stock(&self) -> i64 {
        self.batches()
            .iter()
            .filter(|b| b.is_active())
            .map(|b| b.stock)
            .sum()
    }
}

// =============================================================================
// Variation
// =============================================================================

/// A purchasable option of a product (size, flavor) with its own stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variation {
    pub id: String,

    pub name: String,

    /// Unit cost in cents.
    pub cost_cents: i64,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Running stock counter.
    pub stocks: i64,

    /// Threshold at or below which the variation counts as low stock.
    pub stock_alert: i64,

    #[serde(default)]
    pub batch_number: Vec<Batch>,

    /// Earliest batch expiry (derived).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Variation {
    /// Creates an empty variation with a fresh UUID.
    pub fn new(name: impl Into<String>, price_cents: i64, cost_cents: i64, stock_alert: i64) -> Self {
        Variation {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            cost_cents,
            price_cents,
            stocks: 0,
            stock_alert,
            batch_number: Vec::new(),
            expiry_date: None,
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

impl BatchHolder for Variation {
    fn holder_id(&self) -> &str {
        &self.id
    }

    fn batches(&self) -> &[Batch] {
        &self.batch_number
    }

    fn stocks_mut(&mut self) -> &mut i64 {
        &mut self.stocks
    }

    fn append_batch(&mut self, batch: Batch) {
        self.batch_number.push(batch);
        self.expiry_date = earliest_expiry(&self.batch_number);
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Free-form category; compared case-insensitively.
    #[serde(default)]
    pub category: String,

    /// Unit cost in cents.
    pub cost_cents: i64,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Running stock counter. Only meaningful without variations.
    pub stocks: i64,

    /// Threshold at or below which the product counts as low stock.
    pub stock_alert: i64,

    /// Own batches. Only meaningful without variations.
    #[serde(default)]
    pub batch_number: Vec<Batch>,

    #[serde(default)]
    pub variations: Vec<Variation>,

    /// Earliest batch expiry (derived).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub featured: bool,

    /// Hidden products are never offered at the register.
    #[serde(default)]
    pub is_hidden: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates an empty product with a fresh UUID.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price_cents: i64,
        cost_cents: i64,
        stock_alert: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            cost_cents,
            price_cents,
            stocks: 0,
            stock_alert,
            batch_number: Vec::new(),
            variations: Vec::new(),
            expiry_date: None,
            featured: false,
            is_hidden: false,
            created_at: now,
            updated_at: None,
        }
    }

    #[inline]
    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }

    pub fn variation(&self, variation_id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == variation_id)
    }

    pub fn variation_mut(&mut self, variation_id: &str) -> Option<&mut Variation> {
        self.variations.iter_mut().find(|v| v.id == variation_id)
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Sellable stock: own stocks without variations, else the variation sum.
    pub fn total_stocks(&self) -> i64 {
        if self.has_variations() {
            self.variations.iter().map(|v| v.stocks).sum()
        } else {
            self.stocks
        }
    }

    /// Whether the rolled-up expiry date is already behind `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map_or(false, |expiry| expiry < now)
    }
}

impl BatchHolder for Product {
    fn holder_id(&self) -> &str {
        &self.id
    }

    fn batches(&self) -> &[Batch] {
        &self.batch_number
    }

    fn stocks_mut(&mut self) -> &mut i64 {
        &mut self.stocks
    }

    fn append_batch(&mut self, batch: Batch) {
        self.batch_number.push(batch);
        self.expiry_date = earliest_expiry(&self.batch_number);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
