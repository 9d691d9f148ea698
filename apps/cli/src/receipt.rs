//! # Receipt & Quotation Slip Artifacts
//!
//! Plain-text artifacts written after a database commit.
//!
//! ## Purity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CompletedSale (from the committed transaction)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Receipt::from(&sale)  ──render()──►  String  ──write_to()──►  file     │
//! │                                                                         │
//! │  Rendering holds no business logic and never touches the database.      │
//! │  A failed write is reported to the operator; the sale stands.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

use usms_core::{Money, PaymentMethod};
use usms_db::{CompletedSale, QuotationItemRow};

const WIDTH: usize = 46;

/// One printed line item.
#[derive(Debug, Clone)]
pub struct ReceiptLine {
    pub product_name: String,
    pub size_label: String,
    pub quantity: i64,
    pub amount: Money,
}

impl From<&QuotationItemRow> for ReceiptLine {
    fn from(item: &QuotationItemRow) -> Self {
        ReceiptLine {
            product_name: item.product_name.clone(),
            size_label: item.size_label.clone(),
            quantity: item.quantity,
            amount: Money::from_cents(item.subtotal_cents),
        }
    }
}

/// An immutable sales receipt, captured entirely at construction.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub invoice_no: String,
    pub customer: String,
    pub cashier: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub issued_at: DateTime<Utc>,
}

impl From<&CompletedSale> for Receipt {
    fn from(sale: &CompletedSale) -> Self {
        Receipt {
            invoice_no: sale.invoice_no.clone(),
            customer: sale.customer.clone(),
            cashier: sale.processed_by.clone(),
            payment_method: sale.payment_method,
            lines: sale.lines.iter().map(ReceiptLine::from).collect(),
            total: Money::from_cents(sale.total_cents),
            issued_at: sale.processed_at,
        }
    }
}

impl Receipt {
    /// Renders the receipt to text. Pure; no I/O.
    pub fn render(&self) -> String {
        let mut out = String::new();
        rule(&mut out, '=');
        center(&mut out, "USMS STORE RECEIPT");
        rule(&mut out, '=');

        field(&mut out, "Receipt #", &self.invoice_no);
        field(&mut out, "Customer", &self.customer);
        field(&mut out, "Processed By", &self.cashier);
        field(&mut out, "Date", &self.issued_at.format("%Y-%m-%d %H:%M UTC").to_string());

        rule(&mut out, '-');
        item_table(&mut out, &self.lines);
        rule(&mut out, '-');

        field(&mut out, "Payment", self.payment_method.label());
        field(&mut out, "Grand Total", &self.total.to_string());

        rule(&mut out, '=');
        center(&mut out, "Thank you for your purchase!");
        rule(&mut out, '=');
        out
    }

    /// Writes `receipt_<invoice>.txt` into the given directory.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(format!("receipt_{}.txt", self.invoice_no));
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// The artifact handed to a customer at quotation submission: what was
/// reserved and at what frozen prices, pending payment.
#[derive(Debug, Clone)]
pub struct QuotationSlip {
    pub invoice_no: String,
    pub customer: String,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl QuotationSlip {
    /// Renders the slip to text. Pure; no I/O.
    pub fn render(&self) -> String {
        let mut out = String::new();
        rule(&mut out, '=');
        center(&mut out, "USMS QUOTATION");
        rule(&mut out, '=');

        field(&mut out, "Invoice #", &self.invoice_no);
        field(&mut out, "Customer", &self.customer);
        field(&mut out, "Date", &self.created_at.format("%Y-%m-%d %H:%M UTC").to_string());

        rule(&mut out, '-');
        item_table(&mut out, &self.lines);
        rule(&mut out, '-');

        field(&mut out, "Total", &self.total.to_string());
        center(&mut out, "Valid today only. Pay at the counter.");
        rule(&mut out, '=');
        out
    }

    /// Writes `quotation_<invoice>.txt` into the given directory.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(format!("quotation_{}.txt", self.invoice_no));
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}

// =============================================================================
// Layout helpers
// =============================================================================

fn rule(out: &mut String, ch: char) {
    for _ in 0..WIDTH {
        out.push(ch);
    }
    out.push('\n');
}

fn center(out: &mut String, text: &str) {
    let pad = WIDTH.saturating_sub(text.len()) / 2;
    for _ in 0..pad {
        out.push(' ');
    }
    out.push_str(text);
    out.push('\n');
}

fn field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label:<13}: {value}\n"));
}

fn item_table(out: &mut String, lines: &[ReceiptLine]) {
    out.push_str(&format!("{:<26}{:>5}{:>15}\n", "Item", "Qty", "Amount"));
    for line in lines {
        let name: String = format!("{} ({})", line.product_name, line.size_label)
            .chars()
            .take(26)
            .collect();
        out.push_str(&format!(
            "{:<26}{:>5}{:>15}\n",
            name,
            line.quantity,
            line.amount.to_string()
        ));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_receipt() -> Receipt {
        Receipt {
            invoice_no: "INV-260314-0042".to_string(),
            customer: "maria".to_string(),
            cashier: "sales1".to_string(),
            payment_method: PaymentMethod::GCash,
            lines: vec![
                ReceiptLine {
                    product_name: "School Polo".to_string(),
                    size_label: "Standard".to_string(),
                    quantity: 3,
                    amount: Money::from_cents(75000),
                },
                ReceiptLine {
                    product_name: "PE Shirt".to_string(),
                    size_label: "Large".to_string(),
                    quantity: 1,
                    amount: Money::from_cents(18000),
                },
            ],
            total: Money::from_cents(93000),
            issued_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 15, 0).unwrap(),
        }
    }

    #[test]
    fn test_receipt_render_contains_all_fields() {
        let text = sample_receipt().render();

        assert!(text.contains("USMS STORE RECEIPT"));
        assert!(text.contains("INV-260314-0042"));
        assert!(text.contains("maria"));
        assert!(text.contains("sales1"));
        assert!(text.contains("2026-03-14 09:15 UTC"));
        assert!(text.contains("School Polo (Standard)"));
        assert!(text.contains("PE Shirt (Large)"));
        assert!(text.contains("GCash"));
        assert!(text.contains("₱930.00"));
        assert!(text.contains("Thank you for your purchase!"));
    }

    #[test]
    fn test_render_is_pure() {
        let receipt = sample_receipt();
        assert_eq!(receipt.render(), receipt.render());
    }

    #[test]
    fn test_write_to_uses_invoice_in_filename() {
        let dir = std::env::temp_dir();
        let path = sample_receipt().write_to(&dir).unwrap();

        assert!(path.ends_with("receipt_INV-260314-0042.txt"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Grand Total"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_quotation_slip_render() {
        let slip = QuotationSlip {
            invoice_no: "INV-260314-7777".to_string(),
            customer: "maria".to_string(),
            lines: vec![ReceiptLine {
                product_name: "School Polo".to_string(),
                size_label: "Standard".to_string(),
                quantity: 2,
                amount: Money::from_cents(50000),
            }],
            total: Money::from_cents(50000),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 15, 0).unwrap(),
        };

        let text = slip.render();
        assert!(text.contains("USMS QUOTATION"));
        assert!(text.contains("INV-260314-7777"));
        assert!(text.contains("₱500.00"));
        assert!(!text.contains("Payment"));
    }
}
