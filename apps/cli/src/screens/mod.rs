//! # Menu Screens
//!
//! One module per role, plus the guest entry menu.
//!
//! ## Navigation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  guest ──login──► customer | product_manager | sales_manager | admin   │
//! │    │                                  ▲              ▲                  │
//! │    │                                  └── admin may delegate ──┘        │
//! │    └──register──► (stays guest, then logs in)                           │
//! │                                                                         │
//! │  Every action catches its own errors: the message prints in red and     │
//! │  control falls back to the menu that invoked it.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod customer;
pub mod guest;
pub mod product_manager;
pub mod sales_manager;

use std::io::{BufRead, Write};

use usms_core::{EntityStatus, Money, StockStatus};
use usms_db::Database;

use crate::error::AppResult;
use crate::ui::Console;

/// Prints the active-product catalog, optionally filtered by category.
/// Shared by the guest and customer menus.
pub(crate) async fn show_catalog<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("Product Catalog")?;

    let categories = db.categories().list(Some(EntityStatus::Active)).await?;
    if !categories.is_empty() {
        let names: Vec<String> = categories
            .iter()
            .map(|c| format!("[{}] {}", c.id, c.name))
            .collect();
        con.say(format!("Categories: {}", names.join("  ")))?;
    }

    let category_id = match con.prompt("Category id (Enter for all): ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => None,
        Some(input) => match input.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                con.error("Not a category id; showing everything.")?;
                None
            }
        },
    };

    let rows = db.products().catalog(category_id).await?;
    if rows.is_empty() {
        con.warn("No products to show.")?;
        return Ok(());
    }

    con.say(format!(
        "{:<8} {:<28} {:<14} {:>12} {:>7}",
        "CODE", "NAME", "CATEGORY", "PRICE", "STOCK"
    ))?;
    for row in &rows {
        con.say(format!(
            "{:<8} {:<28} {:<14} {:>12} {:>7}",
            row.code,
            row.name,
            row.category_name.as_deref().unwrap_or("-"),
            Money::from_cents(row.price_cents).to_string(),
            row.total_stock
        ))?;
    }

    Ok(())
}

/// Colored label for a derived stock classification.
pub(crate) fn stock_badge(status: StockStatus) -> colored::ColoredString {
    use colored::Colorize;
    match status {
        StockStatus::OutOfStock => status.label().red(),
        StockStatus::LowStock => status.label().yellow(),
        StockStatus::SafeStock => status.label().green(),
    }
}
