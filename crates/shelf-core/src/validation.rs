//! # Validation Module
//!
//! Input checks shared by the allocator, the restock workflow and the
//! product repository.
//!
//! ## Where Checks Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate_batch_number ──► validate_entity_id, validate_stock_quantity  │
//! │  Cart::increase        ──► validate_quantity                            │
//! │  ProductRepository     ──► validate_product (before every save)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_entity_id, validate_quantity};
//!
//! validate_entity_id("prod-7a2b").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Product;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// An id that gets encoded into batch numbers must not be blank.
pub fn validate_entity_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "entity_id".to_string(),
        });
    }
    Ok(())
}

/// Validates a product or variation name.
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_name;
///
/// assert!(validate_name("name", "Cooking Oil 1L").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity held in a batch or added by a restock. Zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock_quantity".to_string(),
        });
    }
    Ok(())
}

/// Quantity of one cart line: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices and costs are non-negative cents; zero is a free item.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Checks a product document before it is written.
///
/// Running `stocks` may go negative after a correction, so it is not
/// checked here; batch quantities may not.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_entity_id(&product.id)?;
    validate_name("name", &product.name)?;
    validate_price_cents("price", product.price_cents)?;
    validate_price_cents("cost", product.cost_cents)?;

    for batch in &product.batch_number {
        validate_stock_quantity(batch.stock)?;
    }

    for variation in &product.variations {
        validate_entity_id(&variation.id)?;
        validate_name("variation name", &variation.name)?;
        validate_price_cents("variation price", variation.price_cents)?;
        validate_price_cents("variation cost", variation.cost_cents)?;
        for batch in &variation.batch_number {
            validate_stock_quantity(batch.stock)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
