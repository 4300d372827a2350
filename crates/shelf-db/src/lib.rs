//! # shelf-db: Database Layer for Shelf
//!
//! SQLite storage for product documents, completed sales and the audit
//! log, plus environment configuration.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Data Flow                                │
//! │                                                                         │
//! │  StockLedger / restock / checkout (shelf-core)                          │
//! │       │  ProductStore::save                                             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│  product       │   │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │    │  transaction   │   │ 001_products │   │   │
//! │  │   │               │    │  audit         │   │ 002, 003 ... │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (SHELF_DB_PATH, default ./shelf.db)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, transaction and audit repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_core::{Restock, StockLedger};
//! use shelf_db::{AppConfig, Database};
//!
//! let config = AppConfig::from_env()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let ledger = StockLedger::new(db.products());
//! let mut product = db.products().require(&product_id).await?;
//! let entries = ledger.restock(&mut product, &Restock::product(24, None), &actor, Utc::now()).await?;
//! db.audit_log().record_all(&entries).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::audit::AuditLogRepository;
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
