//! Order route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use clementine_core::{OrderId, format_usd};

use crate::db::orders::OrderRepository;
use crate::db::parse_object_id;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::invoice;
use crate::state::AppState;

/// One order for the history template.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub placed_at: String,
    pub items: Vec<OrderLineView>,
    pub total: String,
}

/// One order line for templates.
#[derive(Clone)]
pub struct OrderLineView {
    pub title: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let totals = invoice::compute_totals(&order);
        Self {
            id: order.id.to_hex(),
            placed_at: order.placed_at.try_to_rfc3339_string().unwrap_or_default(),
            items: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    title: item.product.title.clone(),
                    quantity: item.quantity,
                    line_total: format_usd(item.line_total()),
                })
                .collect(),
            total: format_usd(totals.total),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderView>,
}

/// Display the signed-in user's order history.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
) -> Result<OrdersTemplate> {
    let buyer = parse_object_id(session_user.id.as_str())
        .map_err(|_| AppError::Unauthorized("invalid session".to_string()))?;

    let orders = OrderRepository::new(state.db()).find_by_buyer(buyer).await?;

    Ok(OrdersTemplate {
        orders: orders.into_iter().map(OrderView::from).collect(),
    })
}

/// Stream the PDF invoice for one of the user's own orders.
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let buyer = parse_object_id(session_user.id.as_str())
        .map_err(|_| AppError::Unauthorized("invalid session".to_string()))?;

    let order_id = OrderId::new(id);
    let order = OrderRepository::new(state.db()).get(&order_id).await?;
    invoice::ensure_owner(&order, buyer)?;

    let pdf = invoice::render(&order)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"invoice-{order_id}.pdf\""),
        ),
    ];

    Ok((headers, pdf).into_response())
}
