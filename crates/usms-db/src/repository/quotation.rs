//! # Quotation Repository
//!
//! The cart-to-sale lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Quotation Lifecycle                                 │
//! │                                                                         │
//! │  cart ──submit──► PENDING ──process (sales manager)──► COMPLETED        │
//! │                      │                                                  │
//! │                      └──expire_stale (older than today)──► EXPIRED      │
//! │                                                                         │
//! │  submit:  ONE transaction. Stock is checked and decremented (reserved), │
//! │           prices are frozen into item subtotals, the submitted cart     │
//! │           lines are deleted. Unsubmitted lines stay in the cart.        │
//! │  process: ONE transaction. Sale ledger entries (prev == new, stock was  │
//! │           already reserved), one sales row per item, status flip.       │
//! │           Receipt rendering happens after commit, outside this module.  │
//! │  expire:  Restores the reserved stock. Idempotent; an expired           │
//! │           quotation is no longer pending and cannot expire again.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{inventory, sale};
use usms_core::codes::generate_invoice_number;
use usms_core::{ChangeType, PaymentMethod, Quotation, QuotationStatus};

/// Which cart lines a submission covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSelection {
    /// Submit the whole cart as one quotation.
    All,
    /// Submit a single cart line by its id.
    Line(i64),
}

/// A pending quotation joined with its customer, for the sales manager
/// work queue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingQuotationRow {
    pub id: i64,
    pub invoice_no: String,
    pub customer: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A quotation item joined with product details for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuotationItemRow {
    pub product_id: i64,
    pub product_name: String,
    pub size_label: String,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

/// Everything the receipt needs, captured inside the processing
/// transaction. Rendering is the shell's job and never touches the
/// database again.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub quotation_id: i64,
    pub invoice_no: String,
    pub customer: String,
    pub processed_by: String,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub lines: Vec<QuotationItemRow>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SubmitLine {
    id: i64,
    product_id: i64,
    size_id: i64,
    quantity: i64,
    code: String,
    price_cents: i64,
    stock: i64,
}

/// Repository for the quotation lifecycle.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: SqlitePool,
}

impl QuotationRepository {
    /// Creates a new QuotationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuotationRepository { pool }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Turns cart lines into a pending quotation.
    ///
    /// In ONE transaction: stock is checked and decremented for every
    /// selected line, subtotals are frozen at current prices, and the
    /// submitted lines are removed from the cart. Any failure rolls the
    /// whole submission back.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - the selection matched no cart lines
    /// * `Err(DbError::InsufficientStock)` - a line exceeds current stock
    pub async fn submit(&self, user_id: i64, selection: CartSelection) -> DbResult<Quotation> {
        // Invoice numbers are random per day; retry on the rare collision
        for _ in 0..3 {
            match self.try_submit(user_id, selection).await {
                Err(DbError::UniqueViolation { ref field, .. })
                    if field.contains("quotations.invoice_no") =>
                {
                    debug!("Invoice number collision, retrying");
                    continue;
                }
                result => return result,
            }
        }

        Err(DbError::Internal(
            "Could not generate a unique invoice number".to_string(),
        ))
    }

    async fn try_submit(&self, user_id: i64, selection: CartSelection) -> DbResult<Quotation> {
        let mut tx = self.pool.begin().await?;

        const LINE_QUERY: &str = "SELECT c.id, c.product_id, c.size_id, c.quantity, \
                                         p.code, p.price_cents, s.stock \
                                  FROM cart c \
                                  JOIN products p ON p.id = c.product_id \
                                  JOIN product_sizes s ON s.id = c.size_id \
                                  WHERE c.user_id = ?1";

        let lines: Vec<SubmitLine> = match selection {
            CartSelection::All => {
                sqlx::query_as(&format!("{LINE_QUERY} ORDER BY c.id"))
                    .bind(user_id)
                    .fetch_all(&mut *tx)
                    .await?
            }
            CartSelection::Line(line_id) => {
                sqlx::query_as(&format!("{LINE_QUERY} AND c.id = ?2"))
                    .bind(user_id)
                    .bind(line_id)
                    .fetch_all(&mut *tx)
                    .await?
            }
        };

        if lines.is_empty() {
            return Err(DbError::not_found("Cart line", "selection".to_string()));
        }

        for line in &lines {
            if line.quantity > line.stock {
                return Err(DbError::InsufficientStock {
                    code: line.code.clone(),
                    available: line.stock,
                    requested: line.quantity,
                });
            }
        }

        let total_cents: i64 = lines.iter().map(|l| l.price_cents * l.quantity).sum();
        let now = Utc::now();
        let invoice_no = generate_invoice_number(now);

        let quotation_id = sqlx::query(
            "INSERT INTO quotations (user_id, invoice_no, total_cents, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(&invoice_no)
        .bind(total_cents)
        .bind(QuotationStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &lines {
            sqlx::query(
                "INSERT INTO quotation_items \
                     (quotation_id, product_id, size_id, quantity, subtotal_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(quotation_id)
            .bind(line.product_id)
            .bind(line.size_id)
            .bind(line.quantity)
            .bind(line.price_cents * line.quantity)
            .execute(&mut *tx)
            .await?;

            // Reserve: the stock leaves the shelf now, not at processing
            sqlx::query("UPDATE product_sizes SET stock = stock - ?2 WHERE id = ?1")
                .bind(line.size_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM cart WHERE id = ?1")
                .bind(line.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(invoice_no = %invoice_no, total_cents = %total_cents, "Quotation submitted");

        Ok(Quotation {
            id: quotation_id,
            user_id,
            invoice_no,
            total_cents,
            status: QuotationStatus::Pending,
            created_at: now,
        })
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Completes a pending quotation as a sale.
    ///
    /// In ONE transaction: a `sale` ledger entry per item (totals unchanged,
    /// the stock was reserved at submission), one sales row per item, and
    /// the status flip to completed. Returns the data the receipt is
    /// rendered from.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no PENDING quotation with this id;
    ///   processing the same quotation twice fails here
    pub async fn process(
        &self,
        quotation_id: i64,
        payment_method: PaymentMethod,
        processor_id: i64,
    ) -> DbResult<CompletedSale> {
        debug!(quotation_id = %quotation_id, "Processing quotation");

        let mut tx = self.pool.begin().await?;

        let quotation = sqlx::query_as::<_, Quotation>(
            "SELECT id, user_id, invoice_no, total_cents, status, created_at \
             FROM quotations WHERE id = ?1 AND status = ?2",
        )
        .bind(quotation_id)
        .bind(QuotationStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Pending quotation", quotation_id.to_string()))?;

        let lines = sqlx::query_as::<_, QuotationItemRow>(
            "SELECT qi.product_id, p.name AS product_name, s.label AS size_label, \
                    qi.quantity, qi.subtotal_cents \
             FROM quotation_items qi \
             JOIN products p ON p.id = qi.product_id \
             JOIN product_sizes s ON s.id = qi.size_id \
             WHERE qi.quotation_id = ?1 \
             ORDER BY qi.id",
        )
        .bind(quotation_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &lines {
            let total: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
            )
            .bind(line.product_id)
            .fetch_one(&mut *tx)
            .await?;

            // Audit entry only; stock totals do not move here
            inventory::append_tx(&mut tx, line.product_id, ChangeType::Sale, line.quantity, total, total)
                .await?;

            sale::record_tx(
                &mut tx,
                line.product_id,
                line.quantity,
                line.subtotal_cents,
                payment_method,
                processor_id,
            )
            .await?;
        }

        let result = sqlx::query("UPDATE quotations SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(quotation_id)
            .bind(QuotationStatus::Completed)
            .bind(QuotationStatus::Pending)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending quotation", quotation_id.to_string()));
        }

        let customer: String = sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
            .bind(quotation.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let processed_by: String = sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
            .bind(processor_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(invoice_no = %quotation.invoice_no, "Quotation completed");

        Ok(CompletedSale {
            quotation_id,
            invoice_no: quotation.invoice_no,
            customer,
            processed_by,
            payment_method,
            total_cents: quotation.total_cents,
            lines,
            processed_at: Utc::now(),
        })
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    /// Expires pending quotations created before today (UTC), restoring
    /// their reserved stock.
    ///
    /// Run at startup and before the sales manager's pending list.
    /// Idempotent: an expired quotation is no longer pending, so a second
    /// sweep finds nothing to restore.
    ///
    /// ## Returns
    /// The number of quotations expired.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let cutoff = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        let mut tx = self.pool.begin().await?;

        let stale_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM quotations WHERE status = ?1 AND created_at < ?2",
        )
        .bind(QuotationStatus::Pending)
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        for id in &stale_ids {
            sqlx::query(
                "UPDATE product_sizes SET stock = stock + ( \
                     SELECT qi.quantity FROM quotation_items qi \
                     WHERE qi.quotation_id = ?1 AND qi.size_id = product_sizes.id) \
                 WHERE id IN (SELECT size_id FROM quotation_items WHERE quotation_id = ?1)",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE quotations SET status = ?2 WHERE id = ?1 AND status = ?3")
                .bind(id)
                .bind(QuotationStatus::Expired)
                .bind(QuotationStatus::Pending)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let expired = stale_ids.len() as u64;
        if expired > 0 {
            info!(expired = %expired, "Expired stale quotations");
        }

        Ok(expired)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a quotation by id (any status).
    pub async fn get(&self, id: i64) -> DbResult<Option<Quotation>> {
        let quotation = sqlx::query_as::<_, Quotation>(
            "SELECT id, user_id, invoice_no, total_cents, status, created_at \
             FROM quotations WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quotation)
    }

    /// The sales manager work queue: pending quotations with their
    /// customers, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<PendingQuotationRow>> {
        let rows = sqlx::query_as::<_, PendingQuotationRow>(
            "SELECT q.id, q.invoice_no, u.username AS customer, q.total_cents, q.created_at \
             FROM quotations q \
             JOIN users u ON u.id = q.user_id \
             WHERE q.status = ?1 \
             ORDER BY q.created_at, q.id",
        )
        .bind(QuotationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// A customer's own quotations, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Quotation>> {
        let quotations = sqlx::query_as::<_, Quotation>(
            "SELECT id, user_id, invoice_no, total_cents, status, created_at \
             FROM quotations WHERE user_id = ?1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    /// The items of a quotation joined with product details.
    pub async fn items(&self, quotation_id: i64) -> DbResult<Vec<QuotationItemRow>> {
        let rows = sqlx::query_as::<_, QuotationItemRow>(
            "SELECT qi.product_id, p.name AS product_name, s.label AS size_label, \
                    qi.quantity, qi.subtotal_cents \
             FROM quotation_items qi \
             JOIN products p ON p.id = qi.product_id \
             JOIN product_sizes s ON s.id = qi.size_id \
             WHERE qi.quotation_id = ?1 \
             ORDER BY qi.id",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use usms_core::Role;

    struct Fixture {
        db: Database,
        customer_id: i64,
        seller_id: i64,
        product_id: i64,
        size_id: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db
            .users()
            .register("maria", "hunter2hunter2", Role::User)
            .await
            .unwrap();
        let seller = db
            .users()
            .register("sales1", "hunter2hunter2", Role::SalesManager)
            .await
            .unwrap();
        let product = db
            .products()
            .create("School Polo", 25000, 10, None, 5)
            .await
            .unwrap();
        let size_id = db.products().sizes(product.id).await.unwrap()[0].id;

        Fixture {
            db,
            customer_id: customer.id,
            seller_id: seller.id,
            product_id: product.id,
            size_id,
        }
    }

    #[tokio::test]
    async fn test_submit_freezes_totals_and_reserves_stock() {
        let f = fixture().await;
        f.db.cart()
            .add_line(f.customer_id, f.product_id, f.size_id, 3)
            .await
            .unwrap();

        let quotation = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap();

        assert_eq!(quotation.status, QuotationStatus::Pending);
        assert_eq!(quotation.total_cents, 75000);
        assert!(quotation.invoice_no.starts_with("INV-"));

        // Total equals the sum of frozen item subtotals
        let items = f.db.quotations().items(quotation.id).await.unwrap();
        let item_sum: i64 = items.iter().map(|i| i.subtotal_cents).sum();
        assert_eq!(item_sum, quotation.total_cents);

        // Stock reserved, cart emptied
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 7);
        assert!(f.db.cart().view(f.customer_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_single_line_leaves_the_rest() {
        let f = fixture().await;
        let other = f
            .db
            .products()
            .create("PE Shirt", 18000, 10, None, 5)
            .await
            .unwrap();
        let other_size = f.db.products().sizes(other.id).await.unwrap()[0].id;

        let cart = f.db.cart();
        cart.add_line(f.customer_id, f.product_id, f.size_id, 2).await.unwrap();
        cart.add_line(f.customer_id, other.id, other_size, 1).await.unwrap();

        let first_line = cart.view(f.customer_id).await.unwrap()[0].line_id;
        let quotation = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::Line(first_line))
            .await
            .unwrap();

        assert_eq!(quotation.total_cents, 50000);

        let remaining = cart.view(f.customer_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].product_name, "PE Shirt");
    }

    #[tokio::test]
    async fn test_submit_rolls_back_on_insufficient_stock() {
        let f = fixture().await;
        let cart = f.db.cart();
        cart.add_line(f.customer_id, f.product_id, f.size_id, 8).await.unwrap();

        // Another customer takes most of the stock first
        let rival = f
            .db
            .users()
            .register("jose", "hunter2hunter2", Role::User)
            .await
            .unwrap();
        cart.add_line(rival.id, f.product_id, f.size_id, 2).await.unwrap();
        f.db.products().set_stock(f.size_id, 5).await.unwrap();

        let err = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { .. }));

        // Nothing moved: stock unchanged, cart intact, no quotation
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 5);
        assert_eq!(cart.view(f.customer_id).await.unwrap().len(), 1);
        assert!(f.db.quotations().list_for_user(f.customer_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_completes_once() {
        let f = fixture().await;
        f.db.cart()
            .add_line(f.customer_id, f.product_id, f.size_id, 3)
            .await
            .unwrap();
        let quotation = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap();

        let completed = f
            .db
            .quotations()
            .process(quotation.id, PaymentMethod::GCash, f.seller_id)
            .await
            .unwrap();

        assert_eq!(completed.customer, "maria");
        assert_eq!(completed.processed_by, "sales1");
        assert_eq!(completed.total_cents, 75000);
        assert_eq!(completed.lines.len(), 1);

        // Sale ledger entry with unchanged totals (reserved at submission)
        let ledger = f.db.inventory().list_page(0).await.unwrap();
        assert_eq!(ledger[0].change_type, ChangeType::Sale);
        assert_eq!(ledger[0].previous_stock, ledger[0].new_stock);
        assert_eq!(ledger[0].new_stock, 7);

        // One sales row carrying the frozen subtotal
        let history = f.db.sales().history_page(0).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total_cents, 75000);

        // Stock does not move again at processing
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 7);

        // A second processing attempt fails cleanly
        assert!(matches!(
            f.db.quotations()
                .process(quotation.id, PaymentMethod::Cash, f.seller_id)
                .await
                .unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_price_edit_does_not_change_frozen_subtotal() {
        let f = fixture().await;
        f.db.cart()
            .add_line(f.customer_id, f.product_id, f.size_id, 2)
            .await
            .unwrap();
        let quotation = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap();

        f.db.products()
            .update_details(f.product_id, None, Some(99000))
            .await
            .unwrap();

        let completed = f
            .db
            .quotations()
            .process(quotation.id, PaymentMethod::Cash, f.seller_id)
            .await
            .unwrap();
        assert_eq!(completed.total_cents, 50000);
    }

    #[tokio::test]
    async fn test_expire_stale_restores_stock_once() {
        let f = fixture().await;
        f.db.cart()
            .add_line(f.customer_id, f.product_id, f.size_id, 4)
            .await
            .unwrap();
        let quotation = f
            .db
            .quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap();
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 6);

        // Backdate the quotation to yesterday
        sqlx::query("UPDATE quotations SET created_at = ?2 WHERE id = ?1")
            .bind(quotation.id)
            .bind(Utc::now() - Duration::days(1))
            .execute(f.db.pool())
            .await
            .unwrap();

        let repo = f.db.quotations();
        assert_eq!(repo.expire_stale(Utc::now()).await.unwrap(), 1);
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 10);
        assert_eq!(
            repo.get(quotation.id).await.unwrap().unwrap().status,
            QuotationStatus::Expired
        );

        // Second sweep finds nothing; stock is not restored twice
        assert_eq!(repo.expire_stale(Utc::now()).await.unwrap(), 0);
        assert_eq!(f.db.products().total_stock(f.product_id).await.unwrap(), 10);

        // An expired quotation cannot be processed
        assert!(matches!(
            repo.process(quotation.id, PaymentMethod::Cash, f.seller_id)
                .await
                .unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_todays_pending_quotations_survive_the_sweep() {
        let f = fixture().await;
        f.db.cart()
            .add_line(f.customer_id, f.product_id, f.size_id, 1)
            .await
            .unwrap();
        f.db.quotations()
            .submit(f.customer_id, CartSelection::All)
            .await
            .unwrap();

        assert_eq!(f.db.quotations().expire_stale(Utc::now()).await.unwrap(), 0);
        assert_eq!(f.db.quotations().list_pending().await.unwrap().len(), 1);
    }
}
