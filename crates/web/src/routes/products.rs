//! Product route handlers.
//!
//! Listing and detail pages need a session; the add/edit/delete actions
//! need an administrator.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use catalog_core::{Price, ProductId};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireUser, take_flash};
use crate::models::{CurrentUser, Flash, FlashLevel, Product};
use crate::routes::redirect_with_flash;
use crate::services::catalog::{CatalogError, CatalogService, ProductForm};
use crate::state::AppState;

const MISSING_FIELDS: &str = "Please fill required fields (name, price, stock).";
const BAD_NUMBERS: &str = "Price must be a number and stock must be an integer.";
const NOT_FOUND: &str = "Product not found.";

// =============================================================================
// View Types
// =============================================================================

/// Product view for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            created_at: product.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            updated_at: product.updated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub products: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub product: ProductView,
}

/// Add/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
    /// "Add" or "Edit".
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
}

// =============================================================================
// Read Routes
// =============================================================================

/// Display the product listing, newest first.
#[instrument(skip(state, user, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<ProductsIndexTemplate, AppError> {
    let products = CatalogService::new(state.pool())
        .list_products(&user)
        .await?
        .iter()
        .map(ProductView::from)
        .collect();

    Ok(ProductsIndexTemplate {
        user: Some(user),
        flash: take_flash(&session).await,
        products,
    })
}

/// Display a single product.
#[instrument(skip(state, user, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.pool())
        .get_product(&user, ProductId::new(id))
        .await
    {
        Ok(product) => Ok(ProductShowTemplate {
            product: ProductView::from(&product),
            user: Some(user),
            flash: take_flash(&session).await,
        }
        .into_response()),
        Err(CatalogError::NotFound) => {
            redirect_with_flash(&session, FlashLevel::Danger, NOT_FOUND, "/products").await
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Admin Routes
// =============================================================================

/// Display the empty add form.
pub async fn new_page(RequireAdmin(user): RequireAdmin, session: Session) -> ProductFormTemplate {
    ProductFormTemplate {
        user: Some(user),
        flash: take_flash(&session).await,
        heading: "Add",
        action: "/products/add".to_string(),
        form: ProductForm::default(),
    }
}

/// Handle the add form.
#[instrument(skip(state, user, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.pool())
        .create_product(&user, &form)
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            add_breadcrumb(
                "catalog",
                "Product created",
                Some(&[("product_id", product.id.to_string().as_str())]),
            );
            redirect_with_flash(
                &session,
                FlashLevel::Success,
                "Product added successfully.",
                "/products",
            )
            .await
        }
        Err(e) => catalog_failure(&session, e, "/products/add").await,
    }
}

/// Display the edit form pre-filled with the stored product.
#[instrument(skip(state, user, session))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match CatalogService::new(state.pool())
        .get_product(&user, ProductId::new(id))
        .await
    {
        Ok(product) => Ok(ProductFormTemplate {
            user: Some(user),
            flash: take_flash(&session).await,
            heading: "Edit",
            action: format!("/products/edit/{}", product.id),
            form: ProductForm::from_product(&product),
        }
        .into_response()),
        Err(e) => catalog_failure(&session, e, "/products").await,
    }
}

/// Handle the edit form.
#[instrument(skip(state, user, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    match CatalogService::new(state.pool())
        .update_product(&user, id, &form)
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product updated");
            add_breadcrumb(
                "catalog",
                "Product updated",
                Some(&[("product_id", product.id.to_string().as_str())]),
            );
            redirect_with_flash(&session, FlashLevel::Success, "Product updated.", "/products")
                .await
        }
        Err(e) => catalog_failure(&session, e, &format!("/products/edit/{id}")).await,
    }
}

/// Handle product deletion. Unknown IDs still report success.
#[instrument(skip(state, user, session))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    match CatalogService::new(state.pool())
        .delete_product(&user, id)
        .await
    {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            add_breadcrumb(
                "catalog",
                "Product deleted",
                Some(&[("product_id", id.to_string().as_str())]),
            );
            redirect_with_flash(&session, FlashLevel::Success, "Product deleted.", "/products")
                .await
        }
        Err(e) => catalog_failure(&session, e, "/products").await,
    }
}

/// Turn a recoverable catalog error into a redirect with a notice.
///
/// Form errors go back to `form_path`; everything else lands on the listing.
async fn catalog_failure(
    session: &Session,
    error: CatalogError,
    form_path: &str,
) -> Result<Response, AppError> {
    match error {
        CatalogError::Validation(_) => {
            redirect_with_flash(session, FlashLevel::Warning, MISSING_FIELDS, form_path).await
        }
        CatalogError::Type(_) => {
            redirect_with_flash(session, FlashLevel::Warning, BAD_NUMBERS, form_path).await
        }
        CatalogError::NotFound => {
            redirect_with_flash(session, FlashLevel::Danger, NOT_FOUND, "/products").await
        }
        CatalogError::Forbidden => {
            redirect_with_flash(
                session,
                FlashLevel::Danger,
                "Admin access required.",
                "/products",
            )
            .await
        }
        CatalogError::Repository(e) => Err(AppError::Database(e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use catalog_core::{Email, Role, UserId};

    use super::*;

    fn product() -> Product {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        Product {
            id: ProductId::new(42),
            name: "Teapot <large>".to_string(),
            description: Some("Holds tea".to_string()),
            price: Price::parse("12.5").unwrap(),
            stock: 3,
            created_at: at,
            updated_at: at,
        }
    }

    fn viewer(role: Role) -> Option<CurrentUser> {
        Some(CurrentUser {
            id: UserId::new(1),
            email: Email::parse("viewer@example.com").unwrap(),
            role,
        })
    }

    #[test]
    fn test_product_view_formats_timestamps() {
        let view = ProductView::from(&product());
        assert_eq!(view.created_at, "2026-03-14 15:09 UTC");
        assert_eq!(view.price.to_string(), "12.5");
    }

    #[test]
    fn test_index_escapes_and_formats_price() {
        let html = ProductsIndexTemplate {
            user: viewer(Role::User),
            flash: None,
            products: vec![ProductView::from(&product())],
        }
        .render()
        .unwrap();

        assert!(html.contains("Teapot &#60;large&#62;") || html.contains("Teapot &lt;large&gt;"));
        assert!(html.contains("12.50"));
        assert!(html.contains("href=\"/products/42\""));
        assert!(!html.contains("/products/delete/42"));
    }

    #[test]
    fn test_index_shows_admin_controls_to_admins() {
        let html = ProductsIndexTemplate {
            user: viewer(Role::Admin),
            flash: None,
            products: vec![ProductView::from(&product())],
        }
        .render()
        .unwrap();

        assert!(html.contains("href=\"/products/add\""));
        assert!(html.contains("href=\"/products/edit/42\""));
        assert!(html.contains("action=\"/products/delete/42\""));
    }

    #[test]
    fn test_empty_index() {
        let html = ProductsIndexTemplate {
            user: viewer(Role::User),
            flash: None,
            products: Vec::new(),
        }
        .render()
        .unwrap();

        assert!(html.contains("No products yet."));
    }

    #[test]
    fn test_edit_form_is_prefilled() {
        let html = ProductFormTemplate {
            user: viewer(Role::Admin),
            flash: Some(Flash::new(FlashLevel::Warning, BAD_NUMBERS)),
            heading: "Edit",
            action: "/products/edit/42".to_string(),
            form: ProductForm::from_product(&product()),
        }
        .render()
        .unwrap();

        assert!(html.contains("action=\"/products/edit/42\""));
        assert!(html.contains("value=\"12.5\""));
        assert!(html.contains("value=\"3\""));
        assert!(html.contains("Holds tea"));
        assert!(html.contains("Price must be a number and stock must be an integer."));
    }
}
