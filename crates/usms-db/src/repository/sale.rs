//! # Sales Repository
//!
//! Write-once sales records and the transaction history viewer.
//!
//! One sales row is written per quotation item at processing time, carrying
//! the frozen subtotal from the quotation. Rows are never edited; refunds
//! are out of scope.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use usms_core::{PaymentMethod, PAGE_SIZE};

/// A sales row joined with product and seller names for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleHistoryRow {
    pub id: i64,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub processed_by: String,
    pub created_at: chrono::DateTime<Utc>,
}

/// Repository for sales records.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale outside of any larger transaction.
    ///
    /// Quotation processing writes its rows via [`record_tx`] so they
    /// commit together with the status flip; this standalone variant
    /// exists for tooling and tests.
    pub async fn record(
        &self,
        product_id: i64,
        quantity: i64,
        total_cents: i64,
        payment_method: PaymentMethod,
        user_id: i64,
    ) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        record_tx(&mut conn, product_id, quantity, total_cents, payment_method, user_id).await
    }

    /// Returns one page of the sales history, newest first.
    pub async fn history_page(&self, page: i64) -> DbResult<Vec<SaleHistoryRow>> {
        debug!(page = %page, "Fetching sales history page");

        let rows = sqlx::query_as::<_, SaleHistoryRow>(
            "SELECT s.id, p.code AS product_code, p.name AS product_name, \
                    s.quantity, s.total_cents, s.payment_method, \
                    u.username AS processed_by, s.created_at \
             FROM sales s \
             JOIN products p ON p.id = s.product_id \
             JOIN users u ON u.id = s.user_id \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT ?1 OFFSET ?2",
        )
        .bind(PAGE_SIZE)
        .bind(page * PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total number of sales rows (for page-count display).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts a sales row on an existing connection or transaction.
pub(crate) async fn record_tx(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    user_id: i64,
) -> DbResult<i64> {
    debug!(
        product_id = %product_id,
        quantity = %quantity,
        total_cents = %total_cents,
        "Recording sale"
    );

    let id = sqlx::query(
        "INSERT INTO sales (product_id, quantity, total_cents, payment_method, user_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(total_cents)
    .bind(payment_method)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use usms_core::Role;

    #[tokio::test]
    async fn test_record_and_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
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

        let repo = db.sales();
        repo.record(product.id, 2, 50000, PaymentMethod::Cash, seller.id)
            .await
            .unwrap();
        repo.record(product.id, 1, 25000, PaymentMethod::GCash, seller.id)
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);

        let page = repo.history_page(0).await.unwrap();
        assert_eq!(page.len(), 2);
        // Newest first
        assert_eq!(page[0].payment_method, PaymentMethod::GCash);
        assert_eq!(page[0].processed_by, "sales1");
        assert_eq!(page[1].total_cents, 50000);
        assert_eq!(page[1].product_name, "School Polo");
    }
}
