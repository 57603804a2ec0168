//! Cart route handlers.
//!
//! All cart routes require a signed-in user; the cart lives on the user
//! document. Mutations run as read-modify-write through the pure `Cart`
//! methods and a single `save_cart` persistence call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;

use clementine_core::{ProductId, format_usd};

use crate::db::products::ProductRepository;
use crate::db::{RepositoryError, parse_object_id, users::UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::services::cart::{CartService, ResolvedCart};
use crate::state::AppState;

/// One cart line for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub title: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub is_empty: bool,
}

impl From<ResolvedCart> for CartTemplate {
    fn from(cart: ResolvedCart) -> Self {
        let total = format_usd(cart.total());
        let is_empty = cart.is_empty();
        let lines = cart
            .items
            .into_iter()
            .map(|item| CartLineView {
                product_id: item.product.id.to_hex(),
                title: item.product.title.clone(),
                quantity: item.quantity,
                unit_price: format_usd(item.product.price),
                line_total: format_usd(item.line_total()),
                image_url: item.product.image.url.clone(),
            })
            .collect();

        Self {
            lines,
            total,
            is_empty,
        }
    }
}

/// Form body for cart mutations.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    pub product_id: String,
}

/// Display the cart page.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
) -> Result<CartTemplate> {
    let user = UserRepository::new(state.db())
        .get_by_id(&session_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))?;

    let resolved = CartService::new(state.db()).resolved_cart(&user.cart).await?;

    Ok(resolved.into())
}

/// Add one unit of a product to the cart.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Form(form): Form<CartItemForm>,
) -> Result<Redirect> {
    let product_id = parse_object_id(&form.product_id)
        .map_err(|_| AppError::BadRequest("invalid product id".to_string()))?;

    let users = UserRepository::new(state.db());
    let mut user = users
        .get_by_id(&session_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))?;

    // Only existing products may enter the cart
    ProductRepository::new(state.db())
        .get(&ProductId::new(form.product_id.clone()))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_string()),
            other => other.into(),
        })?;

    user.cart.add(product_id);
    users.save_cart(user.id, &user.cart).await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a product's whole line from the cart.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Form(form): Form<CartItemForm>,
) -> Result<Redirect> {
    let product_id = parse_object_id(&form.product_id)
        .map_err(|_| AppError::BadRequest("invalid product id".to_string()))?;

    let users = UserRepository::new(state.db());
    let mut user = users
        .get_by_id(&session_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))?;

    user.cart.remove(&product_id);
    users.save_cart(user.id, &user.cart).await?;

    Ok(Redirect::to("/cart"))
}
