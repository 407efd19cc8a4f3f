//! Domain models for the catalog.

pub mod product;
pub mod session;
pub mod user;

pub use product::{Product, ProductInput};
pub use session::{CurrentUser, Flash, FlashLevel};
pub use user::User;
