//! Catalog service.
//!
//! Product CRUD over the catalog store. Every operation takes the caller's
//! [`CurrentUser`] as proof of a session; mutations additionally require the
//! admin role.

mod error;

pub use error::CatalogError;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use catalog_core::{Price, ProductId, Role};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::middleware::auth::require_role;
use crate::models::product::{Product, ProductInput};
use crate::models::session::CurrentUser;

/// Raw product form fields as submitted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
}

impl ProductForm {
    /// Pre-fill a form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
        }
    }
}

impl ProductInput {
    /// Validate raw form fields into a product input.
    ///
    /// All fields are trimmed; a blank description becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if name, price or stock is blank.
    /// Returns `CatalogError::Type` if price is not a non-negative decimal or
    /// stock is not a non-negative integer.
    pub fn parse(form: &ProductForm) -> Result<Self, CatalogError> {
        let name = form.name.trim();
        let price = form.price.trim();
        let stock = form.stock.trim();

        if name.is_empty() || price.is_empty() || stock.is_empty() {
            return Err(CatalogError::Validation(
                "name, price and stock are required".to_string(),
            ));
        }

        let price = Price::parse(price).map_err(|e| CatalogError::Type(e.to_string()))?;
        let stock = stock
            .parse::<u32>()
            .map_err(|_| CatalogError::Type(format!("stock is not a non-negative integer: {stock}")))?;

        let description = form
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            description,
            price,
            stock,
        })
    }
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list_products(&self, _session: &CurrentUser) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list().await?)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn get_product(
        &self,
        _session: &CurrentUser,
        id: ProductId,
    ) -> Result<Product, CatalogError> {
        self.products.get(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Forbidden` for non-admin sessions, and
    /// `Validation`/`Type` for bad form input.
    pub async fn create_product(
        &self,
        session: &CurrentUser,
        form: &ProductForm,
    ) -> Result<Product, CatalogError> {
        require_role(session, Role::Admin).map_err(|_| CatalogError::Forbidden)?;
        let input = ProductInput::parse(form)?;

        Ok(self.products.create(&input, Utc::now()).await?)
    }

    /// Update a product in place.
    ///
    /// `updated_at` always moves strictly forward; `created_at` is preserved.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Forbidden` for non-admin sessions, `NotFound`
    /// for unknown IDs (checked before the form), and `Validation`/`Type` for
    /// bad form input.
    pub async fn update_product(
        &self,
        session: &CurrentUser,
        id: ProductId,
        form: &ProductForm,
    ) -> Result<Product, CatalogError> {
        require_role(session, Role::Admin).map_err(|_| CatalogError::Forbidden)?;
        let existing = self.products.get(id).await?.ok_or(CatalogError::NotFound)?;
        let input = ProductInput::parse(form)?;

        let updated_at = next_timestamp(existing.updated_at, Utc::now());

        self.products
            .update(id, &input, updated_at)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::NotFound,
                other => CatalogError::Repository(other),
            })
    }

    /// Delete a product. Unknown IDs are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Forbidden` for non-admin sessions.
    pub async fn delete_product(
        &self,
        session: &CurrentUser,
        id: ProductId,
    ) -> Result<(), CatalogError> {
        require_role(session, Role::Admin).map_err(|_| CatalogError::Forbidden)?;

        if !self.products.delete(id).await? {
            tracing::debug!(product_id = %id, "Delete of unknown product ignored");
        }
        Ok(())
    }
}

/// Pick an update timestamp strictly after `previous`.
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
