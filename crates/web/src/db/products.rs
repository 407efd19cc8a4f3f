//! Product repository for database operations.
//!
//! Prices are stored as decimal text and parsed back into [`Price`] on read.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use catalog_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";

/// Raw `products` row.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid stock for product {}: {}",
                row.id, row.stock
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product with `created_at = updated_at = now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &ProductInput,
        now: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price.to_string())
        .bind(i64::from(input.stock))
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Overwrite a product's fields and set its `updated_at`.
    ///
    /// `created_at` is never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        updated_at: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = ?, description = ?, price = ?, stock = ?, updated_at = ?
            WHERE id = ?
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price.to_string())
        .bind(i64::from(input.stock))
        .bind(updated_at)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product by ID.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a batch of products in one transaction, optionally deleting
    /// every existing product first.
    ///
    /// Either the whole batch lands or the catalog is left untouched.
    ///
    /// # Returns
    ///
    /// The number of deleted rows and the number of inserted rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn import(
        &self,
        inputs: &[ProductInput],
        clear_existing: bool,
        now: DateTime<Utc>,
    ) -> Result<(u64, usize), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cleared = if clear_existing {
            sqlx::query("DELETE FROM products")
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            0
        };

        for input in inputs {
            sqlx::query(
                r"
                INSERT INTO products (name, description, price, stock, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(input.price.to_string())
            .bind(i64::from(input.stock))
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((cleared, inputs.len()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::test_pool;

    fn input(name: &str, price: &str, stock: u32) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: None,
            price: Price::parse(price).unwrap(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_preserves_decimal_price() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);
        let now = Utc::now();

        let created = products.create(&input("Widget", "9.99", 5), now).await.unwrap();
        let fetched = products.get(created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.price.amount(), Decimal::new(999, 2));
        assert_eq!(fetched.created_at, now);
        assert_eq!(fetched.updated_at, now);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);
        let t0 = Utc::now();

        products.create(&input("Old", "1", 1), t0).await.unwrap();
        products
            .create(&input("New", "2", 2), t0 + Duration::seconds(10))
            .await
            .unwrap();
        products
            .create(&input("Middle", "3", 3), t0 + Duration::milliseconds(1500))
            .await
            .unwrap();

        let names: Vec<String> = products
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["New", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);

        let err = products
            .update(ProductId::new(404), &input("X", "1", 1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_went_away() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);
        let created = products
            .create(&input("Gone", "1", 1), Utc::now())
            .await
            .unwrap();

        assert!(products.delete(created.id).await.unwrap());
        assert!(!products.delete(created.id).await.unwrap());
        assert!(products.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_replaces_catalog() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);
        products.create(&input("Old", "1", 1), Utc::now()).await.unwrap();

        let batch = [input("A", "2", 2), input("B", "3", 3)];
        let (cleared, inserted) = products.import(&batch, true, Utc::now()).await.unwrap();

        assert_eq!((cleared, inserted), (1, 2));
        let mut names: Vec<String> = products
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_failed_import_leaves_catalog_untouched() {
        let pool = test_pool().await;
        let products = ProductRepository::new(&pool);
        products.create(&input("Keep", "1", 1), Utc::now()).await.unwrap();

        sqlx::query(
            r"
            CREATE TRIGGER reject_broken BEFORE INSERT ON products
            WHEN NEW.name = 'Broken'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            ",
        )
        .execute(&pool)
        .await
        .unwrap();

        let batch = [input("Fine", "2", 2), input("Broken", "3", 3)];
        let err = products.import(&batch, true, Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Database(_)));

        let names: Vec<String> = products
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Keep"]);
    }
}
