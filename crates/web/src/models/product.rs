//! Product domain types.

use chrono::{DateTime, Utc};

use catalog_core::{Price, ProductId};

/// A catalog product (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name, never empty.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    pub stock: u32,
    /// When the product was created. Never changes afterwards.
    pub created_at: DateTime<Utc>,
    /// When the product was last created or updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated product fields, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
}
