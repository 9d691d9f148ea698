//! # usms-db: Database Layer for USMS
//!
//! This crate provides database access for the Uniform Sales & Management
//! System. It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          USMS Data Flow                                 │
//! │                                                                         │
//! │  Menu handler (e.g. "Process Pending Quotation")                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     usms-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ ProductRepo   │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ QuotationRepo │    │ 001_init.sql │   │   │
//! │  │   │ Connection    │    │ UserRepo ...  │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (usms.db)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use usms_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/usms.db");
//! let db = Database::new(config).await?;
//!
//! let catalog = db.products().catalog(None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::{CartRepository, CartViewRow};
pub use repository::category::CategoryRepository;
pub use repository::inventory::{InventoryRepository, LedgerRow};
pub use repository::product::{CatalogRow, ProductRepository, StockOverviewRow};
pub use repository::quotation::{
    CartSelection, CompletedSale, PendingQuotationRow, QuotationItemRow, QuotationRepository,
};
pub use repository::sale::{SaleHistoryRow, SaleRepository};
pub use repository::user::UserRepository;
