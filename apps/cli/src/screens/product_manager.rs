//! The product manager menu: catalog CRUD, categories, restock, ledger.

use std::io::{BufRead, Write};

use usms_core::validation::{
    validate_category_name, validate_product_code, validate_product_name, validate_restock,
    validate_stock,
};
use usms_core::{CoreError, EntityStatus, Money, DELETE_CONFIRMATION_PHRASE, PAGE_SIZE};
use usms_db::Database;

use crate::error::AppResult;
use crate::screens::stock_badge;
use crate::session::Session;
use crate::ui::{is_exit, Console};

pub async fn run<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    loop {
        con.heading(&format!("Product Manager — {}", session.username))?;
        con.say("[1] List products")?;
        con.say("[2] Add product")?;
        con.say("[3] Edit product")?;
        con.say("[4] Delete product")?;
        con.say("[5] Categories")?;
        con.say("[6] Restock")?;
        con.say("[7] Request recovery")?;
        con.say("[8] Inventory ledger")?;
        con.say("[X] Logout")?;

        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => list_products(db, con).await,
            "2" => add_product(db, con).await,
            "3" => edit_product(db, con).await,
            "4" => delete_product(db, con).await,
            "5" => categories_menu(db, con).await,
            "6" => restock(db, con).await,
            "7" => request_recovery(db, con).await,
            "8" => ledger_viewer(db, con).await,
            _ => {
                con.error("Unknown option.")?;
                Ok(())
            }
        };

        if let Err(e) = result {
            con.error(&e)?;
        }
    }
}

async fn list_products<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("All Products")?;

    let products = db.products().list(None, None).await?;
    if products.is_empty() {
        con.warn("No products.")?;
        return Ok(());
    }

    con.say(format!(
        "{:<8} {:<28} {:>12} {:<18}",
        "CODE", "NAME", "PRICE", "STATUS"
    ))?;
    for p in &products {
        con.say(format!(
            "{:<8} {:<28} {:>12} {:<18}",
            p.code,
            p.name,
            p.price().to_string(),
            p.status.label()
        ))?;
    }
    Ok(())
}

async fn add_product<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Add Product")?;

    let name = match con.prompt_nonempty("Name: ")? {
        Some(n) => n,
        None => return Ok(()),
    };
    validate_product_name(&name)?;

    let price = match con.prompt_money("Price: ")? {
        Some(p) => p,
        None => return Ok(()),
    };

    let stock = match con.prompt_i64_in("Initial stock: ", 0, 1_000_000)? {
        Some(s) => s,
        None => return Ok(()),
    };

    let categories = db.categories().list(Some(EntityStatus::Active)).await?;
    let category_id = if categories.is_empty() {
        None
    } else {
        for c in &categories {
            con.say(format!("  [{}] {}", c.id, c.name))?;
        }
        match con.prompt("Category id (Enter for none): ")? {
            None => return Ok(()),
            Some(input) if input.is_empty() => None,
            Some(input) => match input.parse::<i64>() {
                Ok(id) if categories.iter().any(|c| c.id == id) => Some(id),
                _ => {
                    con.error("Not a listed category.")?;
                    return Ok(());
                }
            },
        }
    };

    let critical = match con.prompt("Critical stock level (Enter for 5): ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => 5,
        Some(input) => match input.parse::<i64>() {
            Ok(c) if c >= 0 => c,
            _ => {
                con.error("Critical level must be a non-negative number.")?;
                return Ok(());
            }
        },
    };

    let product = db
        .products()
        .create(&name, price.cents(), stock, category_id, critical)
        .await?;
    con.success(format!(
        "Product {} '{}' created at {} with stock {}.",
        product.code,
        product.name,
        product.price(),
        stock
    ))?;
    Ok(())
}

async fn edit_product<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Edit Product")?;

    let code = match con.prompt_nonempty("Product code: ")? {
        Some(c) => c.to_ascii_uppercase(),
        None => return Ok(()),
    };
    validate_product_code(&code)?;

    let product = db
        .products()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(code.clone()))?;
    con.say(format!(
        "Editing {}: '{}' at {} ({})",
        product.code,
        product.name,
        product.price(),
        product.status.label()
    ))?;
    con.say("Press Enter at any field to keep the current value.")?;

    let name = match con.prompt("New name: ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => None,
        Some(input) => {
            validate_product_name(&input)?;
            Some(input)
        }
    };

    let price_cents = match con.prompt("New price: ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => None,
        Some(input) => match Money::parse(&input) {
            Some(p) if !p.is_negative() => Some(p.cents()),
            _ => {
                con.error("Not a valid price.")?;
                return Ok(());
            }
        },
    };

    if name.is_some() || price_cents.is_some() {
        db.products()
            .update_details(product.id, name.as_deref(), price_cents)
            .await?;
    }

    // Stock is per size; an absolute correction writes an edit ledger entry
    let sizes = db.products().sizes(product.id).await?;
    for size in &sizes {
        let prompt = format!("New stock for '{}' (current {}): ", size.label, size.stock);
        match con.prompt(&prompt)? {
            None => break,
            Some(input) if input.is_empty() => continue,
            Some(input) => match input.parse::<i64>() {
                Ok(new_stock) => {
                    validate_stock(new_stock)?;
                    db.products().set_stock(size.id, new_stock).await?;
                }
                Err(_) => con.error("Not a number; keeping current stock.")?,
            },
        }
    }

    con.success(format!("Product {} updated.", product.code))?;
    Ok(())
}

async fn delete_product<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("Delete Product")?;

    let code = match con.prompt_nonempty("Product code: ")? {
        Some(c) => c.to_ascii_uppercase(),
        None => return Ok(()),
    };
    validate_product_code(&code)?;

    let product = db
        .products()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(code.clone()))?;

    con.warn(format!(
        "This soft-deletes {} '{}' and writes off its remaining stock.",
        product.code, product.name
    ))?;
    let phrase = con.read_line(&format!("Type '{DELETE_CONFIRMATION_PHRASE}' to proceed: "))?;
    if phrase != DELETE_CONFIRMATION_PHRASE {
        con.warn("Deletion aborted.")?;
        return Ok(());
    }

    db.products().soft_delete(product.id).await?;
    con.success(format!("Product {} deleted.", product.code))?;
    Ok(())
}

async fn categories_menu<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    loop {
        con.heading("Categories")?;

        let categories = db.categories().list(None).await?;
        if categories.is_empty() {
            con.warn("No categories yet.")?;
        }
        for c in &categories {
            con.say(format!("  [{}] {} ({})", c.id, c.name, c.status.label()))?;
        }

        con.say("[1] Add  [2] Rename  [3] Delete  [X] Back")?;
        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => add_category(db, con).await,
            "2" => rename_category(db, con).await,
            "3" => delete_category(db, con).await,
            _ => {
                con.error("Unknown option.")?;
                Ok(())
            }
        };

        if let Err(e) = result {
            con.error(&e)?;
        }
    }
}

async fn add_category<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    let name = match con.prompt_nonempty("Category name: ")? {
        Some(n) => n,
        None => return Ok(()),
    };
    validate_category_name(&name)?;

    let category = db.categories().create(&name).await?;
    con.success(format!("Category '{}' created.", category.name))?;
    Ok(())
}

async fn rename_category<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    let id = match con.prompt_i64("Category id: ")? {
        Some(id) => id,
        None => return Ok(()),
    };
    let name = match con.prompt_nonempty("New name: ")? {
        Some(n) => n,
        None => return Ok(()),
    };
    validate_category_name(&name)?;

    db.categories().rename(id, &name).await?;
    con.success("Category renamed.")?;
    Ok(())
}

async fn delete_category<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    let id = match con.prompt_i64("Category id: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    if !con.confirm("Soft-delete this category? Its products remain sellable.")? {
        con.warn("Deletion aborted.")?;
        return Ok(());
    }

    db.categories().soft_delete(id).await?;
    con.success("Category deleted.")?;
    Ok(())
}

async fn restock<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Restock")?;

    let overview = db.products().stock_overview().await?;
    if overview.is_empty() {
        con.warn("No active products to restock.")?;
        return Ok(());
    }

    con.say(format!(
        "{:<6} {:<8} {:<24} {:<10} {:>6} {:>8} {}",
        "SIZE#", "CODE", "NAME", "SIZE", "STOCK", "DAMAGED", "STATUS"
    ))?;
    for row in &overview {
        let status = usms_core::StockStatus::classify(row.stock, row.critical_level);
        con.say(format!(
            "{:<6} {:<8} {:<24} {:<10} {:>6} {:>8} {}",
            row.size_id,
            row.code,
            row.name,
            row.label,
            row.stock,
            row.damaged,
            stock_badge(status)
        ))?;
    }

    let size_id = match con.prompt_i64("Size# to restock: ")? {
        Some(id) => id,
        None => return Ok(()),
    };
    if !overview.iter().any(|r| r.size_id == size_id) {
        con.error("Not a listed size.")?;
        return Ok(());
    }

    let received = match con.prompt_i64("Units received: ")? {
        Some(r) => r,
        None => return Ok(()),
    };
    let damaged = match con.prompt_i64("Of which damaged: ")? {
        Some(d) => d,
        None => return Ok(()),
    };

    let good = validate_restock(received, damaged)?;
    let size = db.products().restock(size_id, received, damaged).await?;
    con.success(format!(
        "Restocked {} usable units ({} damaged). '{}' now holds {}.",
        good, damaged, size.label, size.stock
    ))?;
    Ok(())
}

async fn request_recovery<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("Request Recovery")?;

    let products = db.products().list(Some(EntityStatus::Deleted), None).await?;
    let categories = db.categories().list(Some(EntityStatus::Deleted)).await?;
    if products.is_empty() && categories.is_empty() {
        con.warn("Nothing is deleted.")?;
        return Ok(());
    }

    for p in &products {
        con.say(format!("  product  [{}] {} '{}'", p.id, p.code, p.name))?;
    }
    for c in &categories {
        con.say(format!("  category [{}] '{}'", c.id, c.name))?;
    }

    let kind = con.read_line("Recover a [P]roduct or [C]ategory? ")?;
    if is_exit(&kind) {
        return Ok(());
    }
    let id = match con.prompt_i64("Id: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    match kind.to_ascii_lowercase().as_str() {
        "p" => db.products().request_recovery(id).await?,
        "c" => db.categories().request_recovery(id).await?,
        _ => {
            con.error("Enter P or C.")?;
            return Ok(());
        }
    }

    con.success("Recovery requested. An admin must approve it.")?;
    Ok(())
}

async fn ledger_viewer<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Inventory Ledger")?;

    let total = db.inventory().count().await?;
    if total == 0 {
        con.warn("The ledger is empty.")?;
        return Ok(());
    }
    let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;

    let mut page: i64 = 0;
    loop {
        let rows = db.inventory().list_page(page).await?;
        con.say(format!(
            "{:<8} {:<24} {:<8} {:>6} {:>6} {:>6}  {}",
            "CODE", "NAME", "TYPE", "QTY", "PREV", "NEW", "WHEN"
        ))?;
        for row in &rows {
            con.say(format!(
                "{:<8} {:<24} {:<8} {:>6} {:>6} {:>6}  {}",
                row.product_code,
                row.product_name,
                format!("{:?}", row.change_type).to_uppercase(),
                row.quantity,
                row.previous_stock,
                row.new_stock,
                row.created_at.format("%Y-%m-%d %H:%M")
            ))?;
        }
        con.say(format!("Page {} of {}", page + 1, pages))?;

        let nav = con.read_line("[F]orward  [B]ack  [X] Exit: ")?;
        match nav.to_ascii_lowercase().as_str() {
            "f" if page + 1 < pages => page += 1,
            "f" => con.warn("Already at the last page.")?,
            "b" if page > 0 => page -= 1,
            "b" => con.warn("Already at the first page.")?,
            s if is_exit(s) => return Ok(()),
            _ => con.error("Enter F, B, or X.")?,
        }
    }
}
