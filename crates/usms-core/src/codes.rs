//! # Code Generation
//!
//! Product codes and invoice numbers.
//!
//! Both are random rather than sequential so that codes leak nothing about
//! catalog size or sales volume. Uniqueness is enforced by the database;
//! callers retry on the rare collision.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Generates a product code: `P` followed by 5 random digits.
///
/// ## Example
/// ```rust
/// use usms_core::codes::generate_product_code;
/// use usms_core::validation::validate_product_code;
///
/// let code = generate_product_code();
/// assert!(validate_product_code(&code).is_ok());
/// ```
pub fn generate_product_code() -> String {
    let mut rng = rand::thread_rng();
    format!("P{:05}", rng.gen_range(0..100_000))
}

/// Generates an invoice number for a quotation.
///
/// Format: `INV-yymmdd-NNNN` where NNNN is a random disambiguator.
/// The date prefix keeps paper receipts sortable by eye.
pub fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    format!("INV-{}-{:04}", now.format("%y%m%d"), rng.gen_range(0..10_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_product_code;
    use chrono::TimeZone;

    #[test]
    fn test_product_code_format() {
        for _ in 0..100 {
            let code = generate_product_code();
            assert_eq!(code.len(), 6);
            assert!(validate_product_code(&code).is_ok());
        }
    }

    #[test]
    fn test_invoice_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let invoice = generate_invoice_number(now);
        assert!(invoice.starts_with("INV-260314-"));
        assert_eq!(invoice.len(), "INV-260314-0000".len());
    }
}
