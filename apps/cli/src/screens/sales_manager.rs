//! The sales manager menu: process quotations, expire stale ones, history.

use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::Path;

use usms_core::{Money, PaymentMethod, PAGE_SIZE};
use usms_db::Database;

use crate::error::AppResult;
use crate::receipt::Receipt;
use crate::session::Session;
use crate::ui::{is_exit, Console};

pub async fn run<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
    receipt_dir: &Path,
) -> AppResult<()> {
    loop {
        con.heading(&format!("Sales Manager — {}", session.username))?;
        con.say("[1] Pending quotations")?;
        con.say("[2] Process quotation")?;
        con.say("[3] Expire stale quotations")?;
        con.say("[4] Transaction history")?;
        con.say("[X] Logout")?;

        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => list_pending(db, con).await,
            "2" => process_quotation(db, con, session, receipt_dir).await,
            "3" => expire_stale(db, con).await,
            "4" => history_viewer(db, con).await,
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

/// Prints the pending work queue after sweeping out anything stale.
async fn list_pending<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Pending Quotations")?;

    // Yesterday's submissions should never appear in today's queue
    let expired = db.quotations().expire_stale(Utc::now()).await?;
    if expired > 0 {
        con.warn(format!("{expired} stale quotation(s) expired; stock restored."))?;
    }

    let pending = db.quotations().list_pending().await?;
    if pending.is_empty() {
        con.warn("No pending quotations.")?;
        return Ok(());
    }

    con.say(format!(
        "{:<6} {:<18} {:<16} {:>12} {}",
        "ID", "INVOICE", "CUSTOMER", "TOTAL", "SUBMITTED"
    ))?;
    for q in &pending {
        con.say(format!(
            "{:<6} {:<18} {:<16} {:>12} {}",
            q.id,
            q.invoice_no,
            q.customer,
            Money::from_cents(q.total_cents).to_string(),
            q.created_at.format("%Y-%m-%d %H:%M")
        ))?;
    }
    Ok(())
}

async fn process_quotation<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
    receipt_dir: &Path,
) -> AppResult<()> {
    list_pending(db, con).await?;

    let id = match con.prompt_i64("Quotation id to process: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    let items = db.quotations().items(id).await?;
    for item in &items {
        con.say(format!(
            "  {} ({}) x {} = {}",
            item.product_name,
            item.size_label,
            item.quantity,
            Money::from_cents(item.subtotal_cents)
        ))?;
    }

    let payment = loop {
        let input = match con.prompt_nonempty("Payment method (cash/gcash): ")? {
            Some(i) => i,
            None => return Ok(()),
        };
        match PaymentMethod::parse(&input) {
            Some(p) => break p,
            None => con.error("Enter 'cash' or 'gcash'.")?,
        }
    };

    if !con.confirm("Complete this sale?")? {
        con.warn("Processing cancelled.")?;
        return Ok(());
    }

    let completed = db.quotations().process(id, payment, session.user_id).await?;
    con.success(format!(
        "Quotation {} completed: {} via {}.",
        completed.invoice_no,
        Money::from_cents(completed.total_cents),
        payment.label()
    ))?;

    // The sale is committed; a failed receipt write is only a warning
    match Receipt::from(&completed).write_to(receipt_dir) {
        Ok(path) => con.say(format!("Receipt saved to {}", path.display()))?,
        Err(e) => con.warn(format!("Could not write receipt ({e}); the sale is recorded."))?,
    }

    Ok(())
}

async fn expire_stale<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    let expired = db.quotations().expire_stale(Utc::now()).await?;
    if expired == 0 {
        con.say("Nothing to expire.")?;
    } else {
        con.success(format!("{expired} quotation(s) expired; reserved stock restored."))?;
    }
    Ok(())
}

async fn history_viewer<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("Transaction History")?;

    let total = db.sales().count().await?;
    if total == 0 {
        con.warn("No sales recorded yet.")?;
        return Ok(());
    }
    let pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;

    let mut page: i64 = 0;
    loop {
        let rows = db.sales().history_page(page).await?;
        con.say(format!(
            "{:<8} {:<24} {:>5} {:>12} {:<8} {:<14} {}",
            "CODE", "PRODUCT", "QTY", "TOTAL", "VIA", "SELLER", "WHEN"
        ))?;
        for row in &rows {
            con.say(format!(
                "{:<8} {:<24} {:>5} {:>12} {:<8} {:<14} {}",
                row.product_code,
                row.product_name,
                row.quantity,
                Money::from_cents(row.total_cents).to_string(),
                row.payment_method.label(),
                row.processed_by,
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
