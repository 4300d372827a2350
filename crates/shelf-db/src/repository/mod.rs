//! # Repository Module
//!
//! One repository per table, each holding a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database                                                               │
//! │  ├── products()      → ProductRepository      (also a ProductStore)     │
//! │  ├── transactions()  → TransactionRepository                            │
//! │  └── audit_log()     → AuditLogRepository                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod product;
pub mod transaction;
