//! # Category Repository
//!
//! Database operations for product categories.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Category Soft-Delete Lifecycle                       │
//! │                                                                         │
//! │   create ──► Active ──soft_delete──► Deleted                            │
//! │                ▲                        │                               │
//! │                │                request_recovery (manager)              │
//! │                │                        ▼                               │
//! │                └──approve_recovery── PendingRecovery                    │
//! │                       (admin)                                           │
//! │                                                                         │
//! │  There is no rejection path: a pending request stays pending until      │
//! │  an admin approves it.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use usms_core::{Category, EntityStatus};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories, optionally filtered by status.
    ///
    /// ## Arguments
    /// * `status` - `Some(EntityStatus::Active)` for the customer-facing
    ///   list, `None` for every row (recovery screens).
    ///
    /// Always re-queries; callers see changes made since the last call.
    pub async fn list(&self, status: Option<EntityStatus>) -> DbResult<Vec<Category>> {
        let categories = match status {
            Some(s) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, status, created_at FROM categories \
                     WHERE status = ?1 ORDER BY name",
                )
                .bind(s)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, status, created_at FROM categories ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, status, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already exists
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        let name = name.trim();
        debug!(name = %name, "Creating category");

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO categories (name, status, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(EntityStatus::Active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("category name", name),
            other => other,
        })?
        .last_insert_rowid();

        Ok(Category {
            id,
            name: name.to_string(),
            status: EntityStatus::Active,
            created_at: now,
        })
    }

    /// Renames a category.
    pub async fn rename(&self, id: i64, new_name: &str) -> DbResult<()> {
        let new_name = new_name.trim();
        debug!(id = %id, new_name = %new_name, "Renaming category");

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(new_name)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("category name", new_name),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.to_string()));
        }

        Ok(())
    }

    /// Soft-deletes a category.
    ///
    /// Products in the category are NOT cascade-deleted; they keep their
    /// category_id and remain sellable.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting category");

        let result = sqlx::query("UPDATE categories SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(EntityStatus::Deleted)
            .bind(EntityStatus::Active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active category", id.to_string()));
        }

        Ok(())
    }

    /// Flags a deleted category for recovery. Manager-side half of the
    /// recovery workflow; an admin must approve.
    pub async fn request_recovery(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Requesting category recovery");

        let result = sqlx::query("UPDATE categories SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(EntityStatus::PendingRecovery)
            .bind(EntityStatus::Deleted)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Deleted category", id.to_string()));
        }

        Ok(())
    }

    /// Approves a pending recovery, restoring the category to active.
    /// Fails with NotFound when the category is not pending recovery.
    pub async fn approve_recovery(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Approving category recovery");

        let result = sqlx::query("UPDATE categories SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(EntityStatus::Active)
            .bind(EntityStatus::PendingRecovery)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Category pending recovery",
                id.to_string(),
            ));
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

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Polo").await.unwrap();
        repo.create("PE Uniform").await.unwrap();

        let active = repo.list(Some(EntityStatus::Active)).await.unwrap();
        assert_eq!(active.len(), 2);
        // Sorted by name
        assert_eq!(active[0].name, "PE Uniform");
        assert_eq!(active[1].name, "Polo");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Polo").await.unwrap();
        let err = repo.create("Polo").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_recovery_workflow() {
        let db = test_db().await;
        let repo = db.categories();

        let cat = repo.create("Blouse").await.unwrap();

        repo.soft_delete(cat.id).await.unwrap();
        let listed = repo.list(Some(EntityStatus::Active)).await.unwrap();
        assert!(listed.is_empty());

        repo.request_recovery(cat.id).await.unwrap();
        assert_eq!(
            repo.get(cat.id).await.unwrap().unwrap().status,
            EntityStatus::PendingRecovery
        );

        repo.approve_recovery(cat.id).await.unwrap();
        assert_eq!(
            repo.get(cat.id).await.unwrap().unwrap().status,
            EntityStatus::Active
        );
    }

    #[tokio::test]
    async fn test_approve_requires_pending_state() {
        let db = test_db().await;
        let repo = db.categories();

        let cat = repo.create("Slacks").await.unwrap();

        // Active category cannot be approved
        assert!(matches!(
            repo.approve_recovery(cat.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        // Deleted (but not requested) cannot be approved either
        repo.soft_delete(cat.id).await.unwrap();
        assert!(matches!(
            repo.approve_recovery(cat.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
