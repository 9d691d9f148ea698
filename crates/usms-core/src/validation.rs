//! # Validation Module
//!
//! Input validation utilities for USMS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Shell prompts (apps/cli)                                      │
//! │  ├── Basic format checks (empty, numeric parse)                         │
//! │  └── Immediate operator feedback with bounded retries                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - Business rule validation                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL constraints                                               │
//! │  ├── UNIQUE constraints                                                 │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use usms_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("P12345").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Exactly `P` followed by 5 ASCII digits, e.g. `P04217`
///
/// ## Example
/// ```rust
/// use usms_core::validation::validate_product_code;
///
/// assert!(validate_product_code("P12345").is_ok());
/// assert!(validate_product_code("p12345").is_err());
/// assert!(validate_product_code("P1234").is_err());
/// assert!(validate_product_code("X12345").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product code".to_string(),
        });
    }

    let mut chars = code.chars();
    let well_formed = chars.next() == Some('P')
        && code.len() == 6
        && chars.all(|c| c.is_ascii_digit());

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "product code".to_string(),
            reason: "must be 'P' followed by 5 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a category name. Same rules as product names but capped
/// shorter; category names appear in fixed-width menu columns.
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "category name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "category name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 32 characters
/// - Alphanumeric plus underscore
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 32,
        });
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password before it is hashed.
///
/// ## Rules
/// - At least 8 characters, at most 128
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  User enters quantity: 5                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"      │
/// │       │                                                                 │
/// │       └── OK → Proceed with stock check                                 │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
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

/// Validates a price in centavos.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (giveaway items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an initial or edited stock level.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a restock delivery.
///
/// ## Rules
/// - `received` must be positive
/// - `damaged` must satisfy 0 <= damaged <= received
///
/// ## Returns
/// The usable quantity (`received - damaged`) to add to stock.
///
/// ## Example
/// ```rust
/// use usms_core::validation::validate_restock;
///
/// assert_eq!(validate_restock(10, 2).unwrap(), 8);
/// assert!(validate_restock(0, 0).is_err());
/// assert!(validate_restock(5, 6).is_err());
/// assert!(validate_restock(5, -1).is_err());
/// ```
pub fn validate_restock(received: i64, damaged: i64) -> ValidationResult<i64> {
    if received <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "received quantity".to_string(),
        });
    }

    if damaged < 0 || damaged > received {
        return Err(ValidationError::OutOfRange {
            field: "damaged quantity".to_string(),
            min: 0,
            max: received,
        });
    }

    Ok(received - damaged)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("P12345").is_ok());
        assert!(validate_product_code(" P00001 ").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("p12345").is_err());
        assert!(validate_product_code("P1234").is_err());
        assert!(validate_product_code("P123456").is_err());
        assert!(validate_product_code("P12a45").is_err());
        assert!(validate_product_code("X12345").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("PE Uniform Set").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("cashier_1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("s3cret-pass").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(29900).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_restock() {
        assert_eq!(validate_restock(10, 0).unwrap(), 10);
        assert_eq!(validate_restock(10, 10).unwrap(), 0);
        assert_eq!(validate_restock(10, 3).unwrap(), 7);

        assert!(validate_restock(0, 0).is_err());
        assert!(validate_restock(-5, 0).is_err());
        assert!(validate_restock(5, 6).is_err());
        assert!(validate_restock(5, -1).is_err());
    }
}
