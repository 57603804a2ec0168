//! Checkout route handlers.
//!
//! `begin` redirects the buyer to the gateway's hosted page. The success and
//! cancel pages are purely informational; order state comes exclusively from
//! the webhook.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::Redirect};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Post-payment landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {}

/// Abandoned-checkout landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/cancel.html")]
pub struct CheckoutCancelTemplate {}

/// Start checkout: create a gateway session and redirect to its hosted page.
pub async fn begin(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
) -> Result<Redirect> {
    let user = UserRepository::new(state.db())
        .get_by_id(&session_user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))?;

    let service = CheckoutService::new(state.db(), state.gateway(), state.config());
    let session = service.begin(&user).await?;

    Ok(Redirect::to(&session.url))
}

/// Landing page after the gateway reports success to the browser.
///
/// The page deliberately makes no claims about the order: confirmation
/// arrives over the webhook and shows up under `/orders`.
pub async fn success() -> CheckoutSuccessTemplate {
    CheckoutSuccessTemplate {}
}

/// Landing page when the buyer backs out of the hosted checkout.
pub async fn cancel() -> CheckoutCancelTemplate {
    CheckoutCancelTemplate {}
}
