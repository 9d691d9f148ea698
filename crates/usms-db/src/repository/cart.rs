//! # Cart Repository
//!
//! Per-user cart lines. A cart is a scratchpad: nothing here reserves
//! stock until the cart is submitted as a quotation.
//!
//! ## Accumulate-On-Add
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_line(user, P04217, Medium, 2)   →  line: qty 2                     │
//! │  add_line(user, P04217, Medium, 3)   →  same line: qty 5                │
//! │                                                                         │
//! │  One row per (user, product, size); repeated adds accumulate.           │
//! │  Each add checks the accumulated quantity against current stock so      │
//! │  a cart never promises more than the shelf holds right now.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use usms_core::CartLine;

/// A cart line joined with product and size details for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartViewRow {
    pub line_id: i64,
    pub product_code: String,
    pub product_name: String,
    pub size_label: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub subtotal_cents: i64,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds a quantity of a product size to the user's cart, accumulating
    /// onto an existing line for the same (product, size).
    ///
    /// ## Returns
    /// * `Err(DbError::InsufficientStock)` - accumulated quantity would
    ///   exceed the size's current stock
    pub async fn add_line(
        &self,
        user_id: i64,
        product_id: i64,
        size_id: i64,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, size_id = %size_id, quantity = %quantity, "Adding cart line");

        let mut tx = self.pool.begin().await?;

        let (code, stock): (String, i64) = sqlx::query_as(
            "SELECT p.code, s.stock FROM product_sizes s \
             JOIN products p ON p.id = s.product_id \
             WHERE s.id = ?1 AND s.product_id = ?2",
        )
        .bind(size_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product size", size_id.to_string()))?;

        let already: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart \
             WHERE user_id = ?1 AND product_id = ?2 AND size_id = ?3",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size_id)
        .fetch_one(&mut *tx)
        .await?;

        if already + quantity > stock {
            return Err(DbError::InsufficientStock {
                code,
                available: stock - already,
                requested: quantity,
            });
        }

        sqlx::query(
            "INSERT INTO cart (user_id, product_id, size_id, quantity) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id, product_id, size_id) \
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The user's cart joined with product details, oldest line first.
    pub async fn view(&self, user_id: i64) -> DbResult<Vec<CartViewRow>> {
        let rows = sqlx::query_as::<_, CartViewRow>(
            "SELECT c.id AS line_id, p.code AS product_code, p.name AS product_name, \
                    s.label AS size_label, c.quantity, p.price_cents, \
                    p.price_cents * c.quantity AS subtotal_cents \
             FROM cart c \
             JOIN products p ON p.id = c.product_id \
             JOIN product_sizes s ON s.id = c.size_id \
             WHERE c.user_id = ?1 \
             ORDER BY c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Raw cart lines for a user, oldest first.
    pub async fn lines(&self, user_id: i64) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT id, user_id, product_id, size_id, quantity \
             FROM cart WHERE user_id = ?1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Removes one line from the user's cart. The user_id filter stops a
    /// user from deleting lines of someone else's cart.
    pub async fn remove_line(&self, user_id: i64, line_id: i64) -> DbResult<()> {
        debug!(user_id = %user_id, line_id = %line_id, "Removing cart line");

        let result = sqlx::query("DELETE FROM cart WHERE id = ?1 AND user_id = ?2")
            .bind(line_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id.to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use usms_core::Role;

    async fn seeded_db() -> (Database, i64, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .register("maria", "hunter2hunter2", Role::User)
            .await
            .unwrap();
        let product = db
            .products()
            .create("School Polo", 25000, 10, None, 5)
            .await
            .unwrap();
        let size_id = db.products().sizes(product.id).await.unwrap()[0].id;
        (db, user.id, product.id, size_id)
    }

    #[tokio::test]
    async fn test_repeated_adds_accumulate() {
        let (db, user_id, product_id, size_id) = seeded_db().await;
        let repo = db.cart();

        repo.add_line(user_id, product_id, size_id, 2).await.unwrap();
        repo.add_line(user_id, product_id, size_id, 3).await.unwrap();

        let view = repo.view(user_id).await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].quantity, 5);
        assert_eq!(view[0].subtotal_cents, 125000);
    }

    #[tokio::test]
    async fn test_add_beyond_stock_rejected() {
        let (db, user_id, product_id, size_id) = seeded_db().await;
        let repo = db.cart();

        repo.add_line(user_id, product_id, size_id, 8).await.unwrap();

        let err = repo.add_line(user_id, product_id, size_id, 3).await.unwrap_err();
        match err {
            DbError::InsufficientStock { available, requested, .. } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The failed add left the cart untouched
        assert_eq!(repo.view(user_id).await.unwrap()[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_remove_only_own_lines() {
        let (db, user_id, product_id, size_id) = seeded_db().await;
        let other = db
            .users()
            .register("jose", "hunter2hunter2", Role::User)
            .await
            .unwrap();
        let repo = db.cart();

        repo.add_line(user_id, product_id, size_id, 2).await.unwrap();
        let line_id = repo.view(user_id).await.unwrap()[0].line_id;

        assert!(matches!(
            repo.remove_line(other.id, line_id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        repo.remove_line(user_id, line_id).await.unwrap();
        assert!(repo.view(user_id).await.unwrap().is_empty());
    }
}
