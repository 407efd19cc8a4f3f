//! Seed the catalog with products from a YAML file.
//!
//! # File Format
//!
//! ```yaml
//! - name: Widget
//!   description: A very useful widget
//!   price: 9.99
//!   stock: 5
//! - name: Gadget
//!   price: "19.50"
//!   stock: 0
//! ```
//!
//! Every entry is validated with the same rules as the add form before any
//! row is written.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use catalog_web::db::{ProductRepository, RepositoryError};
use catalog_web::models::ProductInput;
use catalog_web::services::{CatalogError, ProductForm};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid product entries")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One product entry as written in the seed file.
///
/// Numbers may be written bare or quoted.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: serde_yaml::Value,
    stock: serde_yaml::Value,
}

impl SeedProduct {
    fn into_form(self) -> ProductForm {
        ProductForm {
            name: self.name,
            description: self.description,
            price: scalar_text(&self.price),
            stock: scalar_text(&self.stock),
        }
    }
}

/// Render a YAML scalar as form text; anything else becomes blank.
fn scalar_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Summary of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub cleared: u64,
    pub inserted: usize,
}

/// Parse and validate seed file content.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid` if
/// any entry fails validation (each failure is logged with its position).
pub fn parse_products(content: &str) -> Result<Vec<ProductInput>, SeedError> {
    let entries: Vec<SeedProduct> = serde_yaml::from_str(content)?;

    let mut inputs = Vec::with_capacity(entries.len());
    let mut invalid = 0;
    for (index, entry) in entries.into_iter().enumerate() {
        let name = entry.name.clone();
        match ProductInput::parse(&entry.into_form()) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                invalid += 1;
                let reason = match e {
                    CatalogError::Validation(msg) | CatalogError::Type(msg) => msg,
                    other => other.to_string(),
                };
                error!("  - entry {} ({name:?}): {reason}", index + 1);
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(inputs)
}

/// Insert products, optionally clearing the catalog first.
///
/// Runs as one transaction: a failure leaves the catalog as it was.
///
/// # Errors
///
/// Returns `SeedError::Repository` if a database operation fails.
pub async fn insert_products(
    pool: &SqlitePool,
    inputs: &[ProductInput],
    clear_existing: bool,
) -> Result<SeedSummary, SeedError> {
    let (cleared, inserted) = ProductRepository::new(pool)
        .import(inputs, clear_existing, Utc::now())
        .await?;

    Ok(SeedSummary { cleared, inserted })
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or if database
/// operations fail.
pub async fn products(file_path: &str, clear_existing: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading products from file");

    // Validate everything before touching the database
    let content = tokio::fs::read_to_string(path).await?;
    let inputs = parse_products(&content)?;
    info!(products = inputs.len(), "Parsed and validated seed file");

    let pool = connect().await?;
    let summary = insert_products(&pool, &inputs, clear_existing).await?;

    info!("Seeding complete!");
    if clear_existing {
        info!("  Products removed: {}", summary.cleared);
    }
    info!("  Products inserted: {}", summary.inserted);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    const SEED: &str = r#"
- name: Widget
  description: A very useful widget
  price: 9.99
  stock: 5
- name: Gadget
  price: "19.50"
  stock: "0"
"#;

    #[test]
    fn test_parse_products() {
        let inputs = parse_products(SEED).unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, "Widget");
        assert_eq!(inputs[0].price.amount(), Decimal::new(999, 2));
        assert_eq!(inputs[0].stock, 5);
        assert_eq!(inputs[1].description, None);
        assert_eq!(inputs[1].price.amount(), Decimal::new(1950, 2));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        let content = r"
- name: Fine
  price: 1
  stock: 1
- name: Negative
  price: -2
  stock: 1
- name: Fractional stock
  price: 1
  stock: 1.5
";
        assert!(matches!(parse_products(content), Err(SeedError::Invalid(2))));
    }

    #[tokio::test]
    async fn test_insert_with_clear() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        catalog_web::db::migrate(&pool).await.unwrap();
        let inputs = parse_products(SEED).unwrap();

        let first = insert_products(&pool, &inputs, false).await.unwrap();
        assert_eq!(first, SeedSummary { cleared: 0, inserted: 2 });

        let second = insert_products(&pool, &inputs, true).await.unwrap();
        assert_eq!(second, SeedSummary { cleared: 2, inserted: 2 });

        let count = ProductRepository::new(&pool).list().await.unwrap().len();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_existing_catalog() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        catalog_web::db::migrate(&pool).await.unwrap();
        insert_products(&pool, &parse_products(SEED).unwrap(), false)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER no_lamps BEFORE INSERT ON products \
             WHEN NEW.name = 'Lamp' BEGIN SELECT RAISE(ABORT, 'no lamps'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let replacement = parse_products(
            "- {name: Chair, price: 5, stock: 1}\n- {name: Lamp, price: 7, stock: 2}\n",
        )
        .unwrap();
        let err = insert_products(&pool, &replacement, true).await.unwrap_err();
        assert!(matches!(err, SeedError::Repository(_)));

        let names: Vec<String> = ProductRepository::new(&pool)
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Widget".to_string()));
        assert!(names.contains(&"Gadget".to_string()));
    }
}
