//! # Inventory Ledger Repository
//!
//! The append-only audit trail of stock movements.
//!
//! ## Ledger Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Ledger Entries                            │
//! │                                                                         │
//! │  add      product created      prev=0       new=initial stock          │
//! │  edit     stock corrected      quantity is the delta (new - prev)       │
//! │  delete   product soft-deleted new=0                                    │
//! │  restock  goods received       quantity is the usable amount            │
//! │  sale     quotation fulfilled  prev == new (stock was reserved at       │
//! │                                submission; this is the audit record)    │
//! │                                                                         │
//! │  previous_stock / new_stock are product-level totals (sum over sizes).  │
//! │  Rows are never updated or deleted, even for soft-deleted products.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use usms_core::{ChangeType, PAGE_SIZE};

/// A ledger row joined with its product for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    pub id: i64,
    pub product_code: String,
    pub product_name: String,
    pub change_type: ChangeType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for the inventory ledger.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Appends a ledger entry outside of any larger transaction.
    ///
    /// Most entries are written by the product/quotation repositories
    /// inside their own transactions via [`append_tx`]; this standalone
    /// variant exists for tooling and tests.
    pub async fn append(
        &self,
        product_id: i64,
        change_type: ChangeType,
        quantity: i64,
        previous_stock: i64,
        new_stock: i64,
    ) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        append_tx(
            &mut conn,
            product_id,
            change_type,
            quantity,
            previous_stock,
            new_stock,
        )
        .await
    }

    /// Returns one page of the ledger, newest first.
    ///
    /// ## Arguments
    /// * `page` - Zero-based page index; each page holds [`PAGE_SIZE`] rows.
    pub async fn list_page(&self, page: i64) -> DbResult<Vec<LedgerRow>> {
        debug!(page = %page, "Fetching ledger page");

        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT l.id, p.code AS product_code, p.name AS product_name, \
                    l.change_type, l.quantity, l.previous_stock, l.new_stock, l.created_at \
             FROM inventory_log l \
             JOIN products p ON p.id = l.product_id \
             ORDER BY l.created_at DESC, l.id DESC \
             LIMIT ?1 OFFSET ?2",
        )
        .bind(PAGE_SIZE)
        .bind(page * PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total number of ledger rows (for page-count display).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Writes a ledger entry on an existing connection or transaction.
///
/// Used by the product and quotation repositories so the audit row commits
/// or rolls back together with the stock movement it records.
pub(crate) async fn append_tx(
    conn: &mut SqliteConnection,
    product_id: i64,
    change_type: ChangeType,
    quantity: i64,
    previous_stock: i64,
    new_stock: i64,
) -> DbResult<()> {
    debug!(
        product_id = %product_id,
        change_type = ?change_type,
        quantity = %quantity,
        "Appending inventory ledger entry"
    );

    sqlx::query(
        "INSERT INTO inventory_log \
             (product_id, change_type, quantity, previous_stock, new_stock, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(product_id)
    .bind(change_type)
    .bind(quantity)
    .bind(previous_stock)
    .bind(new_stock)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db_with_product() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create("Test Polo", 25000, 10, None, 5)
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_product_creation_writes_add_entry() {
        let (db, _) = db_with_product().await;
        let rows = db.inventory().list_page(0).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].change_type, ChangeType::Add);
        assert_eq!(rows[0].previous_stock, 0);
        assert_eq!(rows[0].new_stock, 10);
    }

    #[tokio::test]
    async fn test_pagination_newest_first() {
        let (db, product_id) = db_with_product().await;
        let repo = db.inventory();

        // 14 more entries on top of the creation entry = 15 total
        for i in 0..14 {
            repo.append(product_id, ChangeType::Edit, 1, 10 + i, 11 + i)
                .await
                .unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 15);

        let first = repo.list_page(0).await.unwrap();
        assert_eq!(first.len(), PAGE_SIZE as usize);

        let second = repo.list_page(1).await.unwrap();
        assert_eq!(second.len(), 5);

        // Newest first: the last appended entry leads page 0
        assert_eq!(first[0].new_stock, 24);
        // The creation entry is the oldest row, at the end of page 1
        assert_eq!(second[4].change_type, ChangeType::Add);
    }
}
