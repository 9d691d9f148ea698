//! # Domain Types
//!
//! Core domain types used throughout USMS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │    Quotation    │   │      User       │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id             │   │  id             │   │  id             │        │
//! │  │  code (P#####)  │   │  invoice_no     │   │  username       │        │
//! │  │  name           │   │  status         │   │  role           │        │
//! │  │  price_cents    │   │  total_cents    │   │  status         │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │  EntityStatus   │   │ QuotationStatus │   │  PaymentMethod  │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  Active         │   │  Pending        │   │  Cash           │        │
//! │  │  Deleted        │   │  Completed      │   │  GCash          │        │
//! │  │  PendingRecovery│   │  Expired        │   └─────────────────┘        │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a SQLite AUTOINCREMENT `id`. Products carry a
//! human-facing business code (`P` + 5 digits) and quotations an invoice
//! number; both are unique but separate from the row id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The role attached to a user account. Controls which menus a session
/// can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular customer account: catalog, cart, quotations.
    User,
    /// Manages products, categories, stock.
    ProductManager,
    /// Processes quotations and views transaction history.
    SalesManager,
    /// Manages users and approves recovery requests; may delegate into
    /// the manager views.
    Admin,
}

impl Role {
    /// Parses a role from operator input (case insensitive).
    pub fn parse(input: &str) -> Option<Role> {
        match input.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "product_manager" | "productmanager" => Some(Role::ProductManager),
            "sales_manager" | "salesmanager" => Some(Role::SalesManager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Human-readable label for menus and listings.
    pub const fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::ProductManager => "Product Manager",
            Role::SalesManager => "Sales Manager",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// User Status
// =============================================================================

/// Whether a user account may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    /// Soft-deleted. Blocked from login but kept for sales history.
    Deactivated,
}

// =============================================================================
// Entity Status (products & categories)
// =============================================================================

/// Soft-delete lifecycle shared by products and categories.
///
/// ```text
///            delete                request recovery
///  Active ───────────► Deleted ───────────────────► PendingRecovery
///    ▲                                                     │
///    └─────────────────────────────────────────────────────┘
///                      admin approves
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Deleted,
    /// A manager has asked for this row back; awaiting admin approval.
    PendingRecovery,
}

impl EntityStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            EntityStatus::Active => "ACTIVE",
            EntityStatus::Deleted => "DELETED",
            EntityStatus::PendingRecovery => "PENDING RECOVERY",
        }
    }
}

// =============================================================================
// Quotation Status
// =============================================================================

/// The lifecycle of a quotation.
///
/// Transitions are one-way and happen exactly once:
/// `Pending → Completed` (processed by a sales manager) or
/// `Pending → Expired` (stale, stock restored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Completed,
    Expired,
}

impl Default for QuotationStatus {
    fn default() -> Self {
        QuotationStatus::Pending
    }
}

// =============================================================================
// Inventory Change Type
// =============================================================================

/// Why an inventory ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Product creation; previous_stock is 0.
    Add,
    /// Manual stock edit; quantity is the delta.
    Edit,
    /// Soft delete; new_stock is 0.
    Delete,
    /// Quotation fulfilment audit entry.
    Sale,
    /// Goods received; quantity is the usable amount added.
    Restock,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// GCash mobile wallet.
    GCash,
}

impl PaymentMethod {
    /// Parses operator input (case insensitive).
    pub fn parse(input: &str) -> Option<PaymentMethod> {
        match input.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "gcash" => Some(PaymentMethod::GCash),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::GCash => "GCash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Stock Status (derived, never stored)
// =============================================================================

/// Classification of a size's stock level against its critical threshold.
/// Computed on demand; the database stores only the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    SafeStock,
}

impl StockStatus {
    /// Classifies a stock level.
    ///
    /// ## Example
    /// ```rust
    /// use usms_core::types::StockStatus;
    ///
    /// assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
    /// assert_eq!(StockStatus::classify(3, 5), StockStatus::LowStock);
    /// assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
    /// assert_eq!(StockStatus::classify(6, 5), StockStatus::SafeStock);
    /// ```
    pub const fn classify(stock: i64, critical_level: i64) -> StockStatus {
        if stock <= 0 {
            StockStatus::OutOfStock
        } else if stock <= critical_level {
            StockStatus::LowStock
        } else {
            StockStatus::SafeStock
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "OUT OF STOCK",
            StockStatus::LowStock => "LOW STOCK",
            StockStatus::SafeStock => "SAFE",
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product grouping (e.g. "Polo", "PE Uniform").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A uniform product available for sale. Stock is carried per size in
/// [`ProductSize`] rows; a product without explicit sizes has a single
/// default size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Business code: `P` followed by 5 digits. Unique.
    pub code: String,

    /// Display name shown in the catalog and on receipts.
    pub name: String,

    /// Price in centavos.
    pub price_cents: i64,

    pub category_id: Option<i64>,

    pub status: EntityStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the product is visible in the customer catalog.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }
}

// =============================================================================
// Product Size
// =============================================================================

/// A stocked size of a product. All stock movements happen at this level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSize {
    pub id: i64,
    pub product_id: i64,
    /// e.g. "Small", "Medium", or the default "Standard".
    pub label: String,
    pub stock: i64,
    /// Damaged units accumulated over restocks. Never sellable.
    pub damaged: i64,
    /// At or below this level the size reports LowStock.
    pub critical_level: i64,
}

impl ProductSize {
    /// Derived stock classification for the restock dashboard.
    #[inline]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.critical_level)
    }
}

// =============================================================================
// User
// =============================================================================

/// A system account. Passwords are stored as argon2 hashes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string. Never the plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One (user, product, size) line in a cart. Repeated adds accumulate the
/// quantity instead of creating duplicate lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub size_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Quotation
// =============================================================================

/// A submitted cart awaiting processing by a sales manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Quotation {
    pub id: i64,
    pub user_id: i64,
    /// Human-facing invoice number; unique.
    pub invoice_no: String,
    /// Grand total frozen at submission time, in centavos.
    pub total_cents: i64,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Quotation Item
// =============================================================================

/// A line frozen into a quotation at submission. Immutable; the subtotal
/// keeps the price the customer saw even if the product is later edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuotationItem {
    pub id: i64,
    pub quotation_id: i64,
    pub product_id: i64,
    pub size_id: i64,
    pub quantity: i64,
    /// unit price × quantity at submission time, in centavos.
    pub subtotal_cents: i64,
}

impl QuotationItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Inventory Log Entry
// =============================================================================

/// Append-only audit record of a stock movement. Rows are never updated
/// or deleted, including for soft-deleted products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLogEntry {
    pub id: i64,
    pub product_id: i64,
    pub change_type: ChangeType,
    /// Magnitude of the movement (delta for edits, quantity for sales).
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Line
// =============================================================================

/// A write-once record of a fulfilled quotation item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// The sales manager who processed the quotation.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("  Product_Manager "), Some(Role::ProductManager));
        assert_eq!(Role::parse("salesmanager"), Some(Role::SalesManager));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse("Cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("GCASH"), Some(PaymentMethod::GCash));
        assert_eq!(PaymentMethod::parse("card"), None);
    }

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(1, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(6, 5), StockStatus::SafeStock);
        // Zero critical level: anything in stock is safe
        assert_eq!(StockStatus::classify(1, 0), StockStatus::SafeStock);
    }

    #[test]
    fn test_quotation_status_default() {
        assert_eq!(QuotationStatus::default(), QuotationStatus::Pending);
    }
}
