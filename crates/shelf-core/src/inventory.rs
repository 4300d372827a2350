//! # Inventory Statistics
//!
//! Stock and expiry classification, the dashboard summary and sales totals.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockStatus                         ExpiryStatus                       │
//! │  ───────────                         ────────────                       │
//! │  stocks <= 0      → OutOfStock       no expiry        → NonExpiring     │
//! │  stocks <  alert  → LowStock         expiry <  now    → Expired         │
//! │  otherwise        → InStock          expiry <= now+N  → ExpiringSoon    │
//! │                                      otherwise        → Fresh           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here takes `now` explicitly.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Transaction;
use crate::money::Money;
use crate::types::Product;

/// Days ahead of `now` that count as "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 60;

/// Days back from `now` that count as "recently added".
pub const RECENTLY_ADDED_DAYS: i64 = 7;

// =============================================================================
// Stock Status
// =============================================================================

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(stocks: i64, stock_alert: i64) -> Self {
        if stocks <= 0 {
            StockStatus::OutOfStock
        } else if stocks < stock_alert {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Worst status among the product's sellable lines.
    ///
    /// A product with one empty variation is out of stock even if its other
    /// variations are full.
    pub fn of_product(product: &Product) -> Self {
        stock_lines(product)
            .map(|(stocks, alert)| StockStatus::classify(stocks, alert))
            .max()
            .unwrap_or(StockStatus::InStock)
    }
}

/// `(stocks, stock_alert)` per sellable line.
fn stock_lines(product: &Product) -> Box<dyn Iterator<Item = (i64, i64)> + '_> {
    if product.has_variations() {
        Box::new(product.variations.iter().map(|v| (v.stocks, v.stock_alert)))
    } else {
        Box::new(std::iter::once((product.stocks, product.stock_alert)))
    }
}

/// `(cost, retail)` value of the stock on hand.
fn stock_value(product: &Product) -> (Money, Money) {
    if product.has_variations() {
        product.variations.iter().fold(
            (Money::zero(), Money::zero()),
            |(cost, retail), v| (cost + v.cost().times(v.stocks), retail + v.price().times(v.stocks)),
        )
    } else {
        (
            product.cost().times(product.stocks),
            product.price().times(product.stocks),
        )
    }
}

// =============================================================================
// Expiry Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ExpiryStatus {
    NonExpiring,
    Expired,
    ExpiringSoon,
    Fresh,
}

impl ExpiryStatus {
    pub fn classify(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>, warning_days: i64) -> Self {
        match expiry {
            None => ExpiryStatus::NonExpiring,
            Some(date) if date < now => ExpiryStatus::Expired,
            Some(date) if date <= now + Duration::days(warning_days) => ExpiryStatus::ExpiringSoon,
            Some(_) => ExpiryStatus::Fresh,
        }
    }

    /// Worst status across the product and its variations.
    pub fn of_product(product: &Product, now: DateTime<Utc>, warning_days: i64) -> Self {
        let earliest = product
            .variations
            .iter()
            .filter_map(|v| v.expiry_date)
            .chain(product.expiry_date)
            .min();
        ExpiryStatus::classify(earliest, now, warning_days)
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Figures shown on the inventory dashboard.
///
/// Values are summed per sellable line; every count is per product. The
/// low-stock count includes products that are also out of stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySummary {
    /// Σ cost × stocks.
    pub cost_value: Money,
    /// Σ price × stocks.
    pub retail_value: Money,
    /// Sellable lines: one per variation, or one per plain product.
    pub line_count: usize,
    pub category_count: usize,
    /// Products with any line below its stock alert.
    pub low_stock_count: usize,
    /// Products with any empty line.
    pub out_of_stock_count: usize,
    pub expired_count: usize,
    pub expiring_soon_count: usize,
    pub recently_added_count: usize,
    /// Retail value of the products added in the last week.
    pub recently_added_value: Money,
}

impl InventorySummary {
    /// Builds the summary with the default expiry window.
    pub fn from_products(products: &[Product], now: DateTime<Utc>) -> Self {
        Self::with_warning_days(products, now, EXPIRY_WARNING_DAYS)
    }

    pub fn with_warning_days(products: &[Product], now: DateTime<Utc>, warning_days: i64) -> Self {
        let mut summary = InventorySummary::default();
        let mut categories = HashSet::new();
        let recent_cutoff = now - Duration::days(RECENTLY_ADDED_DAYS);

        for product in products {
            let category = product.category.trim().to_lowercase();
            if !category.is_empty() {
                categories.insert(category);
            }

            let (cost, retail) = stock_value(product);
            summary.cost_value += cost;
            summary.retail_value += retail;
            summary.line_count += stock_lines(product).count();

            if stock_lines(product).any(|(stocks, alert)| stocks < alert) {
                summary.low_stock_count += 1;
            }
            if stock_lines(product).any(|(stocks, _)| stocks <= 0) {
                summary.out_of_stock_count += 1;
            }

            match ExpiryStatus::of_product(product, now, warning_days) {
                ExpiryStatus::Expired => summary.expired_count += 1,
                ExpiryStatus::ExpiringSoon => summary.expiring_soon_count += 1,
                ExpiryStatus::NonExpiring | ExpiryStatus::Fresh => {}
            }

            if product.created_at >= recent_cutoff && product.created_at <= now {
                summary.recently_added_count += 1;
                summary.recently_added_value += retail;
            }
        }

        summary.category_count = categories.len();
        summary
    }

    /// Expected margin if every unit sold at list price.
    pub fn potential_profit(&self) -> Money {
        self.retail_value - self.cost_value
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Sales subtotals per calendar month (UTC) of `year`, January first.
pub fn sales_per_month(transactions: &[Transaction], year: i32) -> [Money; 12] {
    let mut months = [Money::zero(); 12];
    for tx in transactions.iter().filter(|tx| tx.created_at.year() == year) {
        months[tx.created_at.month0() as usize] += tx.subtotal;
    }
    months
}

/// Retail value of stock on hand, grouped by the month each product was
/// created in `year`. Charted next to [`sales_per_month`] as the target.
pub fn stock_value_per_month(products: &[Product], year: i32) -> [Money; 12] {
    let mut months = [Money::zero(); 12];
    for product in products.iter().filter(|p| p.created_at.year() == year) {
        months[product.created_at.month0() as usize] += stock_value(product).1;
    }
    months
}

/// Sum of subtotals of the sales made in the last `days` days up to `now`.
pub fn recent_sales_total(transactions: &[Transaction], now: DateTime<Utc>, days: i64) -> Money {
    let cutoff = now - Duration::days(days);
    transactions
        .iter()
        .filter(|tx| tx.created_at >= cutoff && tx.created_at <= now)
        .map(|tx| tx.subtotal)
        .sum()
}

// =============================================================================
// Filtering
// =============================================================================

/// Inventory tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductFilter {
    All,
    InStock,
    LowStock,
    OutOfStock,
    ExpiringSoon,
    Expired,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product, now: DateTime<Utc>, warning_days: i64) -> bool {
        let expiry = || ExpiryStatus::of_product(product, now, warning_days);
        match self {
            ProductFilter::All => true,
            ProductFilter::InStock => StockStatus::of_product(product) == StockStatus::InStock,
            ProductFilter::LowStock => StockStatus::of_product(product) == StockStatus::LowStock,
            ProductFilter::OutOfStock => StockStatus::of_product(product) == StockStatus::OutOfStock,
            ProductFilter::ExpiringSoon => expiry() == ExpiryStatus::ExpiringSoon,
            ProductFilter::Expired => expiry() == ExpiryStatus::Expired,
        }
    }
}

/// Products shown under `filter`, in input order.
///
/// `warning_days` should be the same window the summary was built with.
pub fn filter_products<'a>(
    products: &'a [Product],
    filter: ProductFilter,
    now: DateTime<Utc>,
    warning_days: i64,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| filter.matches(p, now, warning_days))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
