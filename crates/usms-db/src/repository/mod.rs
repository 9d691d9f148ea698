//! # Repository Module
//!
//! Database repository implementations for USMS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.   │
//! │                                                                         │
//! │  Menu handler                                                           │
//! │       │                                                                 │
//! │       │  db.quotations().submit(user_id, selection)                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  QuotationRepository                                                    │
//! │  ├── submit(&self, user_id, selection)                                  │
//! │  ├── process(&self, id, payment, processor)                             │
//! │  └── expire_stale(&self, now)                                           │
//! │       │                                                                 │
//! │       │  SQL inside one transaction                                     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • SQL is isolated in one place                                         │
//! │  • Multi-statement workflows commit or roll back as a unit              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, sizes, restock, recovery
//! - [`category::CategoryRepository`] - Category CRUD and recovery
//! - [`user::UserRepository`] - Accounts, argon2 auth, admin management
//! - [`cart::CartRepository`] - Cart lines with accumulate-on-add
//! - [`quotation::QuotationRepository`] - Submit / process / expire lifecycle
//! - [`inventory::InventoryRepository`] - Append-only stock ledger
//! - [`sale::SaleRepository`] - Sales records and transaction history

pub mod cart;
pub mod category;
pub mod inventory;
pub mod product;
pub mod quotation;
pub mod sale;
pub mod user;
