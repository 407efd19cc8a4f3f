//! Business logic services for the catalog.
//!
//! # Services
//!
//! - `auth` - Registration, password login, administrator seeding
//! - `catalog` - Product CRUD guarded by role checks

pub mod auth;
pub mod catalog;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogService, ProductForm};
