//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger, cart and checkout failures             │
//! │  └── ValidationError  - Malformed inputs (wrapped as InvalidInput)     │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← StoreError (boxed DbError)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable by the caller. The ledger never retries a
//! failed save; that decision belongs to whoever called it.

use thiserror::Error;

/// Opaque error produced by a [`ProductStore`](crate::store::ProductStore).
///
/// Boxed so the core crate never names a concrete storage backend.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed allocator or workflow arguments.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Stock was added without a variation to a product that has variations.
    ///
    /// ## When This Occurs
    /// ```text
    /// Product "Shampoo" has variations [100ml, 250ml]
    ///      │
    ///      ▼
    /// add_stock_to_entity(product, None, batch)
    ///      │
    ///      ▼
    /// AmbiguousTarget: which variation receives the batch?
    /// ```
    /// The product's own `stocks` field is unused once variations exist, so
    /// the ledger refuses instead of silently writing there.
    #[error("Product {product_id} has variations; a variation must be chosen to add stock")]
    AmbiguousTarget { product_id: String },

    /// A referenced variation does not belong to the product.
    #[error("Variation {variation_id} not found on product {product_id}")]
    VariationNotFound {
        product_id: String,
        variation_id: String,
    },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product store rejected a save or lookup.
    #[error("Persistence failed: {0}")]
    Persistence(#[source] StoreError),

    /// Insufficient stock to complete a sale.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Product exists but cannot be sold right now.
    #[error("{name} cannot be sold: {reason}")]
    ProductUnavailable { name: String, reason: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart operation referenced a line that is not in the cart.
    #[error("{0} is not in the cart")]
    NotInCart(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,
}

impl CoreError {
    /// Creates a VariationNotFound error.
    pub fn variation_not_found(product_id: impl Into<String>, variation_id: impl Into<String>) -> Self {
        CoreError::VariationNotFound {
            product_id: product_id.into(),
            variation_id: variation_id.into(),
        }
    }

    /// Wraps any store failure.
    pub fn persistence(err: impl Into<StoreError>) -> Self {
        CoreError::Persistence(err.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when arguments don't meet requirements.
/// Used for early validation before any mutation happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed batch number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
