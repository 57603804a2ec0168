//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog listing (paginated)
//! GET  /products/{id}          - Product detail
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (pings the database)
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a product to the cart
//! POST /cart/remove            - Remove a product's line from the cart
//!
//! # Checkout
//! POST /checkout               - Create a gateway session and redirect
//! GET  /checkout/success       - Post-payment landing page
//! GET  /checkout/cancel        - Abandoned-checkout landing page
//! POST /webhook                - Gateway event delivery (signed)
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history
//! GET  /orders/{id}/invoice    - PDF invoice download
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/signup            - Signup page
//! POST /auth/signup            - Signup action
//! POST /auth/logout            - Logout action
//!
//! # Admin (requires auth, own products only)
//! GET  /admin/products             - Managed product list
//! GET  /admin/products/new         - New product form
//! POST /admin/products             - Create product (multipart, image upload)
//! GET  /admin/products/{id}/edit   - Edit product form
//! POST /admin/products/{id}        - Update product
//! POST /admin/products/{id}/delete - Delete product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod shop;
pub mod webhook;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};

use crate::filters;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::begin))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route("/products/new", get(admin::new_form))
        .route("/products/{id}", post(admin::update))
        .route("/products/{id}/edit", get(admin::edit_form))
        .route("/products/{id}/delete", post(admin::delete))
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "error/404.html")]
pub struct NotFoundTemplate {}

/// Fallback handler for unmatched routes.
pub async fn not_found() -> (StatusCode, NotFoundTemplate) {
    (StatusCode::NOT_FOUND, NotFoundTemplate {})
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(shop::index))
        .route("/products/{id}", get(shop::show))
        // Cart
        .nest("/cart", cart_routes())
        // Checkout + gateway webhook
        .nest("/checkout", checkout_routes())
        .route("/webhook", post(webhook::receive))
        // Orders
        .nest("/orders", order_routes())
        // Auth
        .nest("/auth", auth_routes())
        // Admin
        .nest("/admin", admin_routes())
        .fallback(not_found)
}
