//! # Product Repository
//!
//! Database operations for products and their stocked sizes.
//!
//! ## Stock Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Where Stock Lives                                   │
//! │                                                                         │
//! │  products            product_sizes                                      │
//! │  ┌──────────────┐    ┌───────────────────────────────┐                  │
//! │  │ P04217       │───►│ Small    stock=12  damaged=1  │                  │
//! │  │ "School Polo"│    │ Medium   stock=3   damaged=0  │ ← LowStock       │
//! │  │ ₱250.00      │    │ Large    stock=0   damaged=2  │ ← OutOfStock     │
//! │  └──────────────┘    └───────────────────────────────┘                  │
//! │                                                                         │
//! │  A product created without explicit sizes gets one 'Standard' row.      │
//! │  Ledger entries record product-level totals around each movement.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation that touches stock also appends its ledger entry inside
//! the same transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::inventory;
use usms_core::codes::generate_product_code;
use usms_core::{ChangeType, EntityStatus, Product, ProductSize, DEFAULT_SIZE_LABEL};

/// A catalog row joined with category name and total stock for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    pub category_name: Option<String>,
    pub total_stock: i64,
}

/// A per-size row for the restock dashboard.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockOverviewRow {
    pub size_id: i64,
    pub code: String,
    pub name: String,
    pub label: String,
    pub stock: i64,
    pub damaged: i64,
    pub critical_level: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a product with a generated `P#####` code and a default
    /// 'Standard' size holding the initial stock.
    ///
    /// In ONE transaction: product insert, size insert, and an `add`
    /// ledger entry (prev=0, new=initial_stock).
    ///
    /// Retries with a fresh code on the rare code collision.
    pub async fn create(
        &self,
        name: &str,
        price_cents: i64,
        initial_stock: i64,
        category_id: Option<i64>,
        critical_level: i64,
    ) -> DbResult<Product> {
        // 100k possible codes; a handful of retries is plenty
        for _ in 0..5 {
            let code = generate_product_code();
            match self
                .try_create(&code, name, price_cents, initial_stock, category_id, critical_level)
                .await
            {
                Err(DbError::UniqueViolation { ref field, .. }) if field.contains("products.code") => {
                    debug!(code = %code, "Product code collision, retrying");
                    continue;
                }
                result => return result,
            }
        }

        Err(DbError::Internal(
            "Could not generate a unique product code".to_string(),
        ))
    }

    async fn try_create(
        &self,
        code: &str,
        name: &str,
        price_cents: i64,
        initial_stock: i64,
        category_id: Option<i64>,
        critical_level: i64,
    ) -> DbResult<Product> {
        let name = name.trim();
        debug!(code = %code, name = %name, "Creating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query(
            "INSERT INTO products (code, name, price_cents, category_id, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        )
        .bind(code)
        .bind(name)
        .bind(price_cents)
        .bind(category_id)
        .bind(EntityStatus::Active)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO product_sizes (product_id, label, stock, damaged, critical_level) \
             VALUES (?1, ?2, ?3, 0, ?4)",
        )
        .bind(product_id)
        .bind(DEFAULT_SIZE_LABEL)
        .bind(initial_stock)
        .bind(critical_level)
        .execute(&mut *tx)
        .await?;

        inventory::append_tx(&mut tx, product_id, ChangeType::Add, initial_stock, 0, initial_stock)
            .await?;

        tx.commit().await?;

        Ok(Product {
            id: product_id,
            code: code.to_string(),
            name: name.to_string(),
            price_cents,
            category_id,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Adds a named size to an existing product.
    ///
    /// The initial stock is recorded as an `edit` ledger entry with the
    /// product totals around the insert.
    pub async fn add_size(
        &self,
        product_id: i64,
        label: &str,
        stock: i64,
        critical_level: i64,
    ) -> DbResult<ProductSize> {
        let label = label.trim();
        debug!(product_id = %product_id, label = %label, "Adding product size");

        let mut tx = self.pool.begin().await?;

        let total_before: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let size_id = sqlx::query(
            "INSERT INTO product_sizes (product_id, label, stock, damaged, critical_level) \
             VALUES (?1, ?2, ?3, 0, ?4)",
        )
        .bind(product_id)
        .bind(label)
        .bind(stock)
        .bind(critical_level)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("size label", label),
            other => other,
        })?
        .last_insert_rowid();

        if stock > 0 {
            inventory::append_tx(
                &mut tx,
                product_id,
                ChangeType::Edit,
                stock,
                total_before,
                total_before + stock,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(ProductSize {
            id: size_id,
            product_id,
            label: label.to_string(),
            stock,
            damaged: 0,
            critical_level,
        })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a product by ID (any status).
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, code, name, price_cents, category_id, status, created_at, updated_at \
             FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code (any status).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, code, name, price_cents, category_id, status, created_at, updated_at \
             FROM products WHERE code = ?1",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by code. The customer-facing lookup.
    pub async fn get_active_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, code, name, price_cents, category_id, status, created_at, updated_at \
             FROM products WHERE code = ?1 AND status = ?2",
        )
        .bind(code.trim())
        .bind(EntityStatus::Active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products filtered by status (None = all), optionally limited
    /// to a category.
    pub async fn list(
        &self,
        status: Option<EntityStatus>,
        category_id: Option<i64>,
    ) -> DbResult<Vec<Product>> {
        const BASE: &str = "SELECT id, code, name, price_cents, category_id, status, \
                            created_at, updated_at FROM products";

        let products = match (status, category_id) {
            (Some(s), Some(cat)) => {
                sqlx::query_as::<_, Product>(&format!(
                    "{BASE} WHERE status = ?1 AND category_id = ?2 ORDER BY name"
                ))
                .bind(s)
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(s), None) => {
                sqlx::query_as::<_, Product>(&format!("{BASE} WHERE status = ?1 ORDER BY name"))
                    .bind(s)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(cat)) => {
                sqlx::query_as::<_, Product>(&format!(
                    "{BASE} WHERE category_id = ?1 ORDER BY name"
                ))
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, Product>(&format!("{BASE} ORDER BY name"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// The customer catalog: active products joined with category name and
    /// total stock across sizes.
    pub async fn catalog(&self, category_id: Option<i64>) -> DbResult<Vec<CatalogRow>> {
        let rows = match category_id {
            Some(cat) => {
                sqlx::query_as::<_, CatalogRow>(
                    "SELECT p.id, p.code, p.name, p.price_cents, c.name AS category_name, \
                            COALESCE((SELECT SUM(s.stock) FROM product_sizes s \
                                      WHERE s.product_id = p.id), 0) AS total_stock \
                     FROM products p \
                     LEFT JOIN categories c ON c.id = p.category_id \
                     WHERE p.status = ?1 AND p.category_id = ?2 \
                     ORDER BY p.name",
                )
                .bind(EntityStatus::Active)
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CatalogRow>(
                    "SELECT p.id, p.code, p.name, p.price_cents, c.name AS category_name, \
                            COALESCE((SELECT SUM(s.stock) FROM product_sizes s \
                                      WHERE s.product_id = p.id), 0) AS total_stock \
                     FROM products p \
                     LEFT JOIN categories c ON c.id = p.category_id \
                     WHERE p.status = ?1 \
                     ORDER BY p.name",
                )
                .bind(EntityStatus::Active)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Lists the sizes of a product.
    pub async fn sizes(&self, product_id: i64) -> DbResult<Vec<ProductSize>> {
        let sizes = sqlx::query_as::<_, ProductSize>(
            "SELECT id, product_id, label, stock, damaged, critical_level \
             FROM product_sizes WHERE product_id = ?1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    /// Gets a single size row.
    pub async fn get_size(&self, size_id: i64) -> DbResult<Option<ProductSize>> {
        let size = sqlx::query_as::<_, ProductSize>(
            "SELECT id, product_id, label, stock, damaged, critical_level \
             FROM product_sizes WHERE id = ?1",
        )
        .bind(size_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(size)
    }

    /// Total stock of a product across its sizes.
    pub async fn total_stock(&self, product_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Per-size stock levels of every active product, for the restock
    /// dashboard. Stock status is classified by the caller.
    pub async fn stock_overview(&self) -> DbResult<Vec<StockOverviewRow>> {
        let rows = sqlx::query_as::<_, StockOverviewRow>(
            "SELECT s.id AS size_id, p.code, p.name, s.label, s.stock, s.damaged, s.critical_level \
             FROM product_sizes s \
             JOIN products p ON p.id = s.product_id \
             WHERE p.status = ?1 \
             ORDER BY p.name, s.id",
        )
        .bind(EntityStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Updates name and/or price. `None` keeps the current value
    /// (blank-keeps-current semantics in the shell).
    pub async fn update_details(
        &self,
        id: i64,
        name: Option<&str>,
        price_cents: Option<i64>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating product details");

        let result = sqlx::query(
            "UPDATE products SET \
                 name = COALESCE(?2, name), \
                 price_cents = COALESCE(?3, price_cents), \
                 updated_at = ?4 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(name.map(str::trim))
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.to_string()));
        }

        Ok(())
    }

    /// Sets a size's stock to an absolute value, writing an `edit` ledger
    /// entry whose quantity is the delta. One transaction.
    pub async fn set_stock(&self, size_id: i64, new_stock: i64) -> DbResult<()> {
        debug!(size_id = %size_id, new_stock = %new_stock, "Setting stock");

        let mut tx = self.pool.begin().await?;

        let size = sqlx::query_as::<_, ProductSize>(
            "SELECT id, product_id, label, stock, damaged, critical_level \
             FROM product_sizes WHERE id = ?1",
        )
        .bind(size_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product size", size_id.to_string()))?;

        let total_before: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
        )
        .bind(size.product_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE product_sizes SET stock = ?2 WHERE id = ?1")
            .bind(size_id)
            .bind(new_stock)
            .execute(&mut *tx)
            .await?;

        let delta = new_stock - size.stock;
        inventory::append_tx(
            &mut tx,
            size.product_id,
            ChangeType::Edit,
            delta,
            total_before,
            total_before + delta,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Records a restock delivery against a size.
    ///
    /// ## Arguments
    /// * `received` - Units delivered; must be positive (validated by the
    ///   caller via `usms_core::validation::validate_restock`)
    /// * `damaged` - Unsellable units among them; `0 <= damaged <= received`
    ///
    /// The usable amount (`received - damaged`) is added to stock, the
    /// damaged count accumulates on the size row, and a `restock` ledger
    /// entry is written. One transaction.
    pub async fn restock(&self, size_id: i64, received: i64, damaged: i64) -> DbResult<ProductSize> {
        let good = received - damaged;
        debug!(size_id = %size_id, received = %received, damaged = %damaged, "Restocking");

        let mut tx = self.pool.begin().await?;

        let size = sqlx::query_as::<_, ProductSize>(
            "SELECT id, product_id, label, stock, damaged, critical_level \
             FROM product_sizes WHERE id = ?1",
        )
        .bind(size_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product size", size_id.to_string()))?;

        let total_before: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
        )
        .bind(size.product_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE product_sizes SET stock = stock + ?2, damaged = damaged + ?3 WHERE id = ?1",
        )
        .bind(size_id)
        .bind(good)
        .bind(damaged)
        .execute(&mut *tx)
        .await?;

        if good > 0 {
            inventory::append_tx(
                &mut tx,
                size.product_id,
                ChangeType::Restock,
                good,
                total_before,
                total_before + good,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(ProductSize {
            stock: size.stock + good,
            damaged: size.damaged + damaged,
            ..size
        })
    }

    /// Soft-deletes a product: status flips to deleted, remaining stock is
    /// zeroed, and a `delete` ledger entry records the write-off. One
    /// transaction. Historical sales and ledger rows keep referencing the
    /// product.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(EntityStatus::Deleted)
        .bind(Utc::now())
        .bind(EntityStatus::Active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active product", id.to_string()));
        }

        let total_before: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(stock), 0) FROM product_sizes WHERE product_id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE product_sizes SET stock = 0 WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        inventory::append_tx(&mut tx, id, ChangeType::Delete, total_before, total_before, 0)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Flags a deleted product for recovery.
    pub async fn request_recovery(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Requesting product recovery");

        let result = sqlx::query(
            "UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(EntityStatus::PendingRecovery)
        .bind(Utc::now())
        .bind(EntityStatus::Deleted)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Deleted product", id.to_string()));
        }

        Ok(())
    }

    /// Approves a pending recovery, restoring the product to active.
    pub async fn approve_recovery(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Approving product recovery");

        let result = sqlx::query(
            "UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(EntityStatus::Active)
        .bind(Utc::now())
        .bind(EntityStatus::PendingRecovery)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Product pending recovery",
                id.to_string(),
            ));
        }

        Ok(())
    }

    /// Lists products awaiting recovery approval (admin screen).
    pub async fn list_pending_recovery(&self) -> DbResult<Vec<Product>> {
        self.list(Some(EntityStatus::PendingRecovery), None).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use usms_core::validation::validate_product_code;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_generates_valid_code_and_default_size() {
        let db = test_db().await;
        let product = db
            .products()
            .create("School Polo", 25000, 10, None, 5)
            .await
            .unwrap();

        assert!(validate_product_code(&product.code).is_ok());
        assert_eq!(product.status, EntityStatus::Active);

        let sizes = db.products().sizes(product.id).await.unwrap();
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].label, DEFAULT_SIZE_LABEL);
        assert_eq!(sizes[0].stock, 10);
    }

    #[tokio::test]
    async fn test_update_details_keeps_unset_fields() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create("School Polo", 25000, 10, None, 5).await.unwrap();

        repo.update_details(product.id, None, Some(27500)).await.unwrap();

        let updated = repo.get(product.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "School Polo");
        assert_eq!(updated.price_cents, 27500);
    }

    #[tokio::test]
    async fn test_set_stock_writes_edit_delta() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create("School Polo", 25000, 10, None, 5).await.unwrap();
        let size = &repo.sizes(product.id).await.unwrap()[0];

        repo.set_stock(size.id, 4).await.unwrap();

        let rows = db.inventory().list_page(0).await.unwrap();
        // Newest first: edit entry then the creation add entry
        assert_eq!(rows[0].change_type, ChangeType::Edit);
        assert_eq!(rows[0].quantity, -6);
        assert_eq!(rows[0].previous_stock, 10);
        assert_eq!(rows[0].new_stock, 4);
    }

    #[tokio::test]
    async fn test_restock_accumulates_damaged() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create("School Polo", 25000, 10, None, 5).await.unwrap();
        let size = &repo.sizes(product.id).await.unwrap()[0];

        let after = repo.restock(size.id, 20, 3).await.unwrap();
        assert_eq!(after.stock, 27);
        assert_eq!(after.damaged, 3);

        let rows = db.inventory().list_page(0).await.unwrap();
        assert_eq!(rows[0].change_type, ChangeType::Restock);
        assert_eq!(rows[0].quantity, 17);
        assert_eq!(rows[0].new_stock, 27);
    }

    #[tokio::test]
    async fn test_soft_delete_zeroes_stock_and_hides_from_catalog() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create("School Polo", 25000, 10, None, 5).await.unwrap();

        repo.soft_delete(product.id).await.unwrap();

        assert!(repo.get_active_by_code(&product.code).await.unwrap().is_none());
        // Still reachable by plain lookup for history rendering
        assert!(repo.get_by_code(&product.code).await.unwrap().is_some());
        assert_eq!(repo.total_stock(product.id).await.unwrap(), 0);

        let rows = db.inventory().list_page(0).await.unwrap();
        assert_eq!(rows[0].change_type, ChangeType::Delete);
        assert_eq!(rows[0].previous_stock, 10);
        assert_eq!(rows[0].new_stock, 0);

        // Double delete fails: no longer active
        assert!(matches!(
            repo.soft_delete(product.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_recovery_workflow() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create("School Polo", 25000, 10, None, 5).await.unwrap();

        repo.soft_delete(product.id).await.unwrap();
        repo.request_recovery(product.id).await.unwrap();

        let pending = repo.list_pending_recovery().await.unwrap();
        assert_eq!(pending.len(), 1);

        repo.approve_recovery(product.id).await.unwrap();
        assert!(repo.get_active_by_code(&product.code).await.unwrap().is_some());

        // Approving twice fails
        assert!(matches!(
            repo.approve_recovery(product.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_catalog_includes_total_stock() {
        let db = test_db().await;
        let repo = db.products();
        let cat = db.categories().create("Polo").await.unwrap();
        let product = repo
            .create("School Polo", 25000, 10, Some(cat.id), 5)
            .await
            .unwrap();
        repo.add_size(product.id, "Large", 7, 5).await.unwrap();

        let catalog = repo.catalog(None).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].total_stock, 17);
        assert_eq!(catalog[0].category_name.as_deref(), Some("Polo"));

        let filtered = repo.catalog(Some(cat.id)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        let other = repo.catalog(Some(cat.id + 1)).await.unwrap();
        assert!(other.is_empty());
    }
}
