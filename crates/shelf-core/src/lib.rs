//! # shelf-core: Stock Ledger and Register Logic for Shelf
//!
//! This crate holds the inventory rules of Shelf: batch numbering, the
//! stock ledger, restocking, inventory statistics and the register cart.
//! It performs no I/O of its own; persistence goes through the
//! [`ProductStore`] trait, implemented in `shelf-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   batch   │  │  ledger   │  │  restock  │  │ inventory │  │   │
//! │  │   │ numbering │  │ add stock │  │ + audit   │  │  summary  │  │   │
//! │  │   └───────────┘  └─────┬─────┘  └─────┬─────┘  └───────────┘  │   │
//! │  │   ┌───────────┐        │              │        ┌───────────┐  │   │
//! │  │   │   cart    │        ▼              ▼        │   money   │  │   │
//! │  │   │ checkout  │   ┌─────────────────────┐      │   types   │  │   │
//! │  │   └───────────┘   │  trait ProductStore │      └───────────┘  │   │
//! │  │                   └──────────┬──────────┘                     │   │
//! │  └──────────────────────────────┼──────────────────────────────────┘   │
//! │                                 │                                       │
//! │  ┌──────────────────────────────▼──────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  │        SQLite documents, migrations, repositories, config       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Variation, Batch
//! - [`batch`] - Batch number allocation and expiry rollup
//! - [`ledger`] - Adding batches to a product or variation
//! - [`restock`] - Receiving deliveries, with audit entries
//! - [`inventory`] - Stock/expiry classification, dashboard figures and sales totals
//! - [`cart`] - Register cart, checkout and transactions
//! - [`audit`] - Audit log entries
//! - [`store`] - Persistence seam
//! - [`money`] - Integer-cents money
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use shelf_core::{apply_batch, generate_batch_number, last_sequence, Product};
//!
//! let now = Utc::now();
//! let mut oil = Product::new("Cooking Oil 1L", "Grocery", 9_800, 7_900, 10, now);
//!
//! let seq = last_sequence(&oil.batch_number);
//! let batch = generate_batch_number(&oil.id, now, seq, 48, None).unwrap();
//! apply_batch(&mut oil, None, batch).unwrap();
//!
//! assert_eq!(oil.batch_number.len(), 1);
//! assert!(oil.batch_number[0].batch_number.ends_with("-001"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod batch;
pub mod cart;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod restock;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{Actor, AuditAction, AuditComponent, AuditEntry, UserRole};
pub use batch::{earliest_expiry, generate_batch_number, last_sequence, BatchNumber};
pub use cart::{apply_sale, filter_by_date_range, sellable_lines, Cart, OrderLine, Transaction};
pub use error::{CoreError, CoreResult, StoreError, ValidationError};
pub use inventory::{
    filter_products, recent_sales_total, sales_per_month, stock_value_per_month, ExpiryStatus,
    InventorySummary, ProductFilter, StockStatus, EXPIRY_WARNING_DAYS, RECENTLY_ADDED_DAYS,
};
pub use ledger::{apply_batch, StockLedger};
pub use money::Money;
pub use restock::Restock;
pub use store::{MemoryProductStore, ProductStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
