//! The customer menu: catalog, cart, quotations.

use std::io::{BufRead, Write};
use std::path::Path;

use usms_core::validation::{validate_product_code, validate_quantity};
use usms_core::{CoreError, Money, MAX_ITEM_QUANTITY};
use usms_db::{CartSelection, Database};

use crate::error::AppResult;
use crate::receipt::{QuotationSlip, ReceiptLine};
use crate::screens;
use crate::session::Session;
use crate::ui::{is_exit, Console};

pub async fn run<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
    receipt_dir: &Path,
) -> AppResult<()> {
    loop {
        con.heading(&format!("Customer Menu — {}", session.username))?;
        con.say("[1] Browse catalog")?;
        con.say("[2] Add to cart")?;
        con.say("[3] View cart")?;
        con.say("[4] Remove cart line")?;
        con.say("[5] Submit quotation")?;
        con.say("[6] My quotations")?;
        con.say("[X] Logout")?;

        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => screens::show_catalog(db, con).await,
            "2" => add_to_cart(db, con, session).await,
            "3" => view_cart(db, con, session).await,
            "4" => remove_line(db, con, session).await,
            "5" => submit_quotation(db, con, session, receipt_dir).await,
            "6" => my_quotations(db, con, session).await,
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

async fn add_to_cart<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    con.heading("Add To Cart")?;

    let code = match con.prompt_nonempty("Product code (P#####): ")? {
        Some(c) => c.to_ascii_uppercase(),
        None => return Ok(()),
    };
    validate_product_code(&code)?;

    let product = db
        .products()
        .get_active_by_code(&code)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(code.clone()))?;

    let sizes = db.products().sizes(product.id).await?;
    let size = if sizes.len() == 1 {
        sizes[0].clone()
    } else {
        con.say(format!("Sizes for {}:", product.name))?;
        for s in &sizes {
            con.say(format!("  {} (stock {})", s.label, s.stock))?;
        }
        let label = match con.prompt_nonempty("Size: ")? {
            Some(l) => l,
            None => return Ok(()),
        };
        match sizes.iter().find(|s| s.label.eq_ignore_ascii_case(&label)) {
            Some(s) => s.clone(),
            None => {
                con.error(format!("No size '{label}' for {}.", product.code))?;
                return Ok(());
            }
        }
    };

    let quantity = match con.prompt_i64_in("Quantity: ", 1, MAX_ITEM_QUANTITY)? {
        Some(q) => q,
        None => return Ok(()),
    };
    validate_quantity(quantity)?;

    db.cart()
        .add_line(session.user_id, product.id, size.id, quantity)
        .await?;

    con.success(format!(
        "Added {} x {} ({}) to your cart.",
        quantity, product.name, size.label
    ))?;
    Ok(())
}

/// Prints the cart and returns its rows for reuse by other flows.
async fn view_cart_rows<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<Vec<usms_db::CartViewRow>> {
    let rows = db.cart().view(session.user_id).await?;
    if rows.is_empty() {
        con.warn("Your cart is empty.")?;
        return Ok(rows);
    }

    con.say(format!(
        "{:<6} {:<8} {:<24} {:<10} {:>5} {:>12} {:>12}",
        "LINE", "CODE", "PRODUCT", "SIZE", "QTY", "PRICE", "SUBTOTAL"
    ))?;
    let mut grand_total = Money::zero();
    for row in &rows {
        grand_total += Money::from_cents(row.subtotal_cents);
        con.say(format!(
            "{:<6} {:<8} {:<24} {:<10} {:>5} {:>12} {:>12}",
            row.line_id,
            row.product_code,
            row.product_name,
            row.size_label,
            row.quantity,
            Money::from_cents(row.price_cents).to_string(),
            Money::from_cents(row.subtotal_cents).to_string()
        ))?;
    }
    con.say(format!("Grand total: {grand_total}"))?;

    Ok(rows)
}

async fn view_cart<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    con.heading("Your Cart")?;
    view_cart_rows(db, con, session).await?;
    Ok(())
}

async fn remove_line<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    con.heading("Remove Cart Line")?;

    let rows = view_cart_rows(db, con, session).await?;
    if rows.is_empty() {
        return Ok(());
    }

    let line_id = match con.prompt_i64("Line to remove: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    db.cart().remove_line(session.user_id, line_id).await?;
    con.success("Line removed.")?;
    Ok(())
}

async fn submit_quotation<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
    receipt_dir: &Path,
) -> AppResult<()> {
    con.heading("Submit Quotation")?;

    let rows = view_cart_rows(db, con, session).await?;
    if rows.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let input = match con.prompt_nonempty("Submit [A]ll or a line number: ")? {
        Some(i) => i,
        None => return Ok(()),
    };

    let (selection, total_cents) = if input.eq_ignore_ascii_case("a") {
        let total: i64 = rows.iter().map(|r| r.subtotal_cents).sum();
        (CartSelection::All, total)
    } else {
        let line_id: i64 = match input.parse() {
            Ok(id) => id,
            Err(_) => {
                con.error("Enter 'A' or a line number.")?;
                return Ok(());
            }
        };
        match rows.iter().find(|r| r.line_id == line_id) {
            Some(row) => (CartSelection::Line(line_id), row.subtotal_cents),
            None => {
                con.error(format!("No cart line {line_id}."))?;
                return Ok(());
            }
        }
    };

    con.say(format!("Quotation total: {}", Money::from_cents(total_cents)))?;
    if !con.confirm("Submit this quotation?")? {
        con.warn("Submission cancelled.")?;
        return Ok(());
    }

    let quotation = db.quotations().submit(session.user_id, selection).await?;
    con.success(format!(
        "Quotation {} submitted for {}. Stock is reserved until processed or expired.",
        quotation.invoice_no,
        quotation.total()
    ))?;

    // Artifact only; the quotation stands even if the write fails
    let items = db.quotations().items(quotation.id).await?;
    let slip = QuotationSlip {
        invoice_no: quotation.invoice_no.clone(),
        customer: session.username.clone(),
        lines: items.iter().map(ReceiptLine::from).collect(),
        total: quotation.total(),
        created_at: quotation.created_at,
    };
    match slip.write_to(receipt_dir) {
        Ok(path) => con.say(format!("Quotation slip saved to {}", path.display()))?,
        Err(e) => con.warn(format!("Could not write quotation slip: {e}"))?,
    }

    Ok(())
}

async fn my_quotations<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    con.heading("My Quotations")?;

    let quotations = db.quotations().list_for_user(session.user_id).await?;
    if quotations.is_empty() {
        con.warn("No quotations yet.")?;
        return Ok(());
    }

    con.say(format!(
        "{:<6} {:<18} {:>12} {:<10} {}",
        "ID", "INVOICE", "TOTAL", "STATUS", "CREATED"
    ))?;
    for q in &quotations {
        con.say(format!(
            "{:<6} {:<18} {:>12} {:<10} {}",
            q.id,
            q.invoice_no,
            q.total().to_string(),
            format!("{:?}", q.status).to_uppercase(),
            q.created_at.format("%Y-%m-%d %H:%M")
        ))?;
    }

    let id = match con.prompt("Quotation id for details (Enter to skip): ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => return Ok(()),
        Some(input) => match input.parse::<i64>() {
            Ok(id) => id,
            Err(_) => return Ok(()),
        },
    };

    if !quotations.iter().any(|q| q.id == id) {
        con.error(format!("Quotation {id} is not yours."))?;
        return Ok(());
    }

    for item in db.quotations().items(id).await? {
        con.say(format!(
            "  {} ({}) x {} = {}",
            item.product_name,
            item.size_label,
            item.quantity,
            Money::from_cents(item.subtotal_cents)
        ))?;
    }
    Ok(())
}
