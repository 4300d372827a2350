//! # Cart and Checkout
//!
//! The register: sellable lines, the cart a cashier builds from them, and
//! the transaction produced at checkout.
//!
//! ## Register Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  &[Product] ──sellable_lines(now)──► Vec<OrderLine>                     │
//! │                 (hidden / expired dropped, variations expanded)         │
//! │                                                                         │
//! │  click line   ──► Cart::add       new → qty 1 │ existing → qty + 1      │
//! │  "+" / "-"    ──► increase / decrease (decrease at 1 removes)           │
//! │  confirm      ──► Cart::checkout(actor, now) ──► Transaction            │
//! │                        │                                                │
//! │                        ▼                                                │
//! │               apply_sale(products, &tx)   stocks -= qty per line        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by [`OrderLine::key`].
//! - `1 <= quantity <= available` for every line in the cart.
//! - At most [`MAX_CART_ITEMS`] lines.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::audit::Actor;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, Variation};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Order Line
// =============================================================================

/// One sellable thing: a plain product or a single variation.
///
/// Price, cost and name are frozen when the line is built, so later catalog
/// edits do not change a cart or a recorded transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,

    #[serde(default)]
    pub variation_id: Option<String>,

    /// Product name, with the variation name appended when there is one.
    pub name: String,

    pub price_cents: i64,

    pub cost_cents: i64,

    /// Stock on hand when the line was built.
    pub available: i64,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,

    pub quantity: i64,
}

impl OrderLine {
    /// Lines a product contributes to the register.
    pub fn from_product(product: &Product) -> Vec<OrderLine> {
        if product.has_variations() {
            product
                .variations
                .iter()
                .map(|v| OrderLine::from_variation(product, v))
                .collect()
        } else {
            vec![OrderLine {
                product_id: product.id.clone(),
                variation_id: None,
                name: product.name.clone(),
                price_cents: product.price_cents,
                cost_cents: product.cost_cents,
                available: product.stocks,
                expiry_date: product.expiry_date,
                quantity: 1,
            }]
        }
    }

    fn from_variation(product: &Product, variation: &Variation) -> OrderLine {
        OrderLine {
            product_id: product.id.clone(),
            variation_id: Some(variation.id.clone()),
            name: format!("{} - {}", product.name, variation.name),
            price_cents: variation.price_cents,
            cost_cents: variation.cost_cents,
            available: variation.stocks,
            expiry_date: variation.expiry_date,
            quantity: 1,
        }
    }

    /// Cart identity: the variation id, or the product id for plain products.
    pub fn key(&self) -> &str {
        self.variation_id.as_deref().unwrap_or(&self.product_id)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }

    /// Line total minus cost of goods.
    pub fn line_profit(&self) -> Money {
        self.line_total() - Money::from_cents(self.cost_cents).times(self.quantity)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map_or(false, |expiry| expiry < now)
    }
}

/// Lines offered at the register.
///
/// Hidden products are dropped entirely, as are expired products and
/// expired variations.
pub fn sellable_lines(products: &[Product], now: DateTime<Utc>) -> Vec<OrderLine> {
    products
        .iter()
        .filter(|p| !p.is_hidden && !p.is_expired(now))
        .flat_map(OrderLine::from_product)
        .filter(|line| !line.is_expired(now))
        .collect()
}

// =============================================================================
// Cart
// =============================================================================

/// The cart being built at the register.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<OrderLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `line`.
    ///
    /// ## Behavior
    /// - Already in the cart: same as [`Cart::increase`].
    /// - New line: inserted with quantity 1, unless it is out of stock or
    ///   the cart is full.
    pub fn add(&mut self, mut line: OrderLine) -> CoreResult<()> {
        if self.line(line.key()).is_some() {
            return self.increase(line.key());
        }

        if line.available <= 0 {
            return Err(CoreError::ProductUnavailable {
                name: line.name,
                reason: "out of stock".to_string(),
            });
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        debug!(key = %line.key(), name = %line.name, "Adding line to cart");
        line.quantity = 1;
        self.lines.push(line);
        Ok(())
    }

    /// Adds one unit to an existing line, bounded by its available stock.
    pub fn increase(&mut self, key: &str) -> CoreResult<()> {
        let line = self.line_mut(key)?;
        let requested = line.quantity + 1;

        if requested > line.available {
            return Err(CoreError::InsufficientStock {
                name: line.name.clone(),
                available: line.available,
                requested,
            });
        }

        validate_quantity(requested).map_err(|_| CoreError::QuantityTooLarge {
            requested,
            max: MAX_ITEM_QUANTITY,
        })?;

        line.quantity = requested;
        Ok(())
    }

    /// Removes one unit; a line at quantity 1 leaves the cart.
    pub fn decrease(&mut self, key: &str) -> CoreResult<()> {
        let line = self.line_mut(key)?;
        if line.quantity > 1 {
            line.quantity -= 1;
            Ok(())
        } else {
            self.remove(key)
        }
    }

    pub fn remove(&mut self, key: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.key() != key);

        if self.lines.len() == before {
            Err(CoreError::NotInCart(key.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn line(&self, key: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.key() == key)
    }

    fn line_mut(&mut self, key: &str) -> CoreResult<&mut OrderLine> {
        self.lines
            .iter_mut()
            .find(|l| l.key() == key)
            .ok_or_else(|| CoreError::NotInCart(key.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Freezes the cart into a transaction attributed to `cashier`.
    ///
    /// The cart itself is left untouched; clear it once the sale has been
    /// applied and saved.
    pub fn checkout(&self, cashier: &Actor, now: DateTime<Utc>) -> CoreResult<Transaction> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            cashier: cashier.clone(),
            lines: self.lines.clone(),
            subtotal: self.subtotal(),
            created_at: now,
        })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub cashier: Actor,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn profit(&self) -> Money {
        self.lines.iter().map(OrderLine::line_profit).sum()
    }
}

/// Decrements running stock for every line of `tx`.
///
/// Lines hitting the same product or variation are checked against stock
/// as one total. All lines are checked first; on error nothing has been
/// changed. Batch records are left as they are.
pub fn apply_sale(products: &mut [Product], tx: &Transaction) -> CoreResult<()> {
    let mut requested: HashMap<(&str, Option<&str>), i64> = HashMap::new();
    for line in &tx.lines {
        *requested
            .entry((line.product_id.as_str(), line.variation_id.as_deref()))
            .or_insert(0) += line.quantity;
    }

    for line in &tx.lines {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        let available = match &line.variation_id {
            Some(variation_id) => {
                product
                    .variation(variation_id)
                    .ok_or_else(|| CoreError::variation_not_found(&product.id, variation_id))?
                    .stocks
            }
            None => product.stocks,
        };

        let total = requested
            .get(&(line.product_id.as_str(), line.variation_id.as_deref()))
            .copied()
            .unwrap_or(line.quantity);

        if total > available {
            return Err(CoreError::InsufficientStock {
                name: line.name.clone(),
                available,
                requested: total,
            });
        }
    }

    for line in &tx.lines {
        let Some(product) = products.iter_mut().find(|p| p.id == line.product_id) else {
            continue;
        };
        let stocks = match &line.variation_id {
            Some(variation_id) => match product.variation_mut(variation_id) {
                Some(variation) => &mut variation.stocks,
                None => continue,
            },
            None => &mut product.stocks,
        };
        *stocks -= line.quantity;
    }

    debug!(transaction_id = %tx.id, lines = tx.lines.len(), "Applied sale to stock");
    Ok(())
}

/// Transactions created within `[from, to]`, both bounds whole UTC days.
///
/// A missing bound is open.
pub fn filter_by_date_range(
    transactions: &[Transaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|tx| {
            let day = tx.created_at.date_naive();
            from.map_or(true, |from| day >= from) && to.map_or(true, |to| day <= to)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::UserRole;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 20, 9, 30, 0).unwrap()
    }

    fn cashier() -> Actor {
        Actor {
            id: "staff-7".to_string(),
            name: "Leo".to_string(),
            email: "leo@example.com".to_string(),
            role: UserRole::Staff,
        }
    }

    fn plain(name: &str, price: i64, stocks: i64) -> Product {
        let mut p = Product::new(name, "Grocery", price, price / 2, 2, now());
        p.stocks = stocks;
        p
    }

    fn shampoo() -> Product {
        let mut p = Product::new("Shampoo", "Personal Care", 0, 0, 2, now());
        let mut small = Variation::new("100ml", 8_500, 6_000, 2);
        small.stocks = 3;
        let mut large = Variation::new("250ml", 16_000, 12_000, 2);
        large.stocks = 0;
        p.variations = vec![small, large];
        p
    }

    #[test]
    fn test_sellable_lines_filters_hidden_and_expired() {
        let rice = plain("Rice", 3_000, 10);
        let mut hidden = plain("Secret", 100, 10);
        hidden.is_hidden = true;
        let mut stale = plain("Bread", 500, 4);
        stale.expiry_date = Some(now() - Duration::days(1));

        let lines = sellable_lines(&[rice, hidden, stale, shampoo()], now());
        let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(names, vec!["Rice", "Shampoo - 100ml", "Shampoo - 250ml"]);
        assert!(lines[1].variation_id.is_some());
        assert_eq!(lines[1].price_cents, 8_500);
    }

    #[test]
    fn test_add_and_increase_bounded_by_stock() {
        let lines = OrderLine::from_product(&shampoo());
        let small = lines[0].clone();
        let key = small.key().to_string();
        let mut cart = Cart::new();

        cart.add(small.clone()).unwrap();
        cart.add(small.clone()).unwrap();
        cart.increase(&key).unwrap();
        assert_eq!(cart.line(&key).unwrap().quantity, 3);

        let err = cart.add(small).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.subtotal().cents(), 25_500);
    }

    #[test]
    fn test_out_of_stock_line_rejected() {
        let large = OrderLine::from_product(&shampoo()).remove(1);
        let mut cart = Cart::new();

        assert!(matches!(
            cart.add(large),
            Err(CoreError::ProductUnavailable { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrease_removes_at_one() {
        let rice = OrderLine::from_product(&plain("Rice", 3_000, 10)).remove(0);
        let key = rice.key().to_string();
        let mut cart = Cart::new();

        cart.add(rice.clone()).unwrap();
        cart.add(rice).unwrap();
        cart.decrease(&key).unwrap();
        assert_eq!(cart.line(&key).unwrap().quantity, 1);

        cart.decrease(&key).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(cart.decrease(&key), Err(CoreError::NotInCart(_))));
        assert!(matches!(cart.remove(&key), Err(CoreError::NotInCart(_))));
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            let line = OrderLine::from_product(&plain(&format!("Item {i}"), 100, 5)).remove(0);
            cart.add(line).unwrap();
        }

        let extra = OrderLine::from_product(&plain("One more", 100, 5)).remove(0);
        assert!(matches!(cart.add(extra), Err(CoreError::CartTooLarge { .. })));
    }

    #[test]
    fn test_checkout_and_apply_sale() {
        let mut products = vec![plain("Rice", 3_000, 10), shampoo()];
        let mut cart = Cart::new();
        for line in sellable_lines(&products, now()) {
            if line.available > 0 {
                cart.add(line).unwrap();
            }
        }
        let rice_key = products[0].id.clone();
        cart.increase(&rice_key).unwrap();

        assert!(matches!(
            Cart::new().checkout(&cashier(), now()),
            Err(CoreError::EmptyCart)
        ));

        let tx = cart.checkout(&cashier(), now()).unwrap();
        assert_eq!(tx.subtotal.cents(), 2 * 3_000 + 8_500);
        assert_eq!(tx.total_quantity(), 3);
        assert_eq!(tx.cashier.email, "leo@example.com");
        assert_eq!(tx.profit().cents(), 2 * 1_500 + 2_500);

        apply_sale(&mut products, &tx).unwrap();
        assert_eq!(products[0].stocks, 8);
        assert_eq!(products[1].variations[0].stocks, 2);
        assert_eq!(products[1].variations[1].stocks, 0);
    }

    #[test]
    fn test_apply_sale_is_all_or_nothing() {
        let mut products = vec![plain("Rice", 3_000, 10), plain("Salt", 800, 1)];
        let mut cart = Cart::new();
        for line in sellable_lines(&products, now()) {
            cart.add(line).unwrap();
        }
        let tx = cart.checkout(&cashier(), now()).unwrap();

        // stock sold elsewhere between checkout and apply
        products[1].stocks = 0;
        let before = products.clone();

        let err = apply_sale(&mut products, &tx).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(products, before);

        let err = apply_sale(&mut products[..1], &tx).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_apply_sale_totals_repeated_lines() {
        let mut products = vec![plain("Sardines", 2_000, 3)];
        let mut line = OrderLine::from_product(&products[0]).remove(0);
        line.quantity = 2;

        let tx = Transaction {
            id: "tx-dup".to_string(),
            cashier: cashier(),
            lines: vec![line.clone(), line],
            subtotal: Money::from_cents(8_000),
            created_at: now(),
        };

        let err = apply_sale(&mut products, &tx).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(products[0].stocks, 3);
    }

    #[test]
    fn test_filter_by_date_range_inclusive_days() {
        let mut cart = Cart::new();
        cart.add(OrderLine::from_product(&plain("Rice", 3_000, 10)).remove(0))
            .unwrap();

        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap();
        let txs: Vec<Transaction> = [at(1, 0), at(3, 23), at(5, 12)]
            .into_iter()
            .map(|ts| cart.checkout(&cashier(), ts).unwrap())
            .collect();

        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 4, d);

        assert_eq!(filter_by_date_range(&txs, None, None).len(), 3);
        assert_eq!(filter_by_date_range(&txs, day(1), day(3)).len(), 2);
        assert_eq!(filter_by_date_range(&txs, day(3), None).len(), 2);
        assert_eq!(filter_by_date_range(&txs, None, day(2)).len(), 1);
        assert!(filter_by_date_range(&txs, day(6), None).is_empty());
    }
}
