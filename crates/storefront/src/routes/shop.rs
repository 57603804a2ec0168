//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use clementine_core::{ProductId, format_usd};

use crate::db::products::{PageInfo, ProductRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.product_id().into_inner(),
            title: product.title,
            description: product.description,
            price: format_usd(product.price),
            image_url: product.image.url,
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Catalog listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopIndexTemplate {
    pub products: Vec<ProductView>,
    pub page: PageInfo,
    pub logged_in: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product_detail.html")]
pub struct ProductDetailTemplate {
    pub product: ProductView,
    pub logged_in: bool,
}

/// Display the paginated catalog listing.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PaginationQuery>,
) -> Result<ShopIndexTemplate> {
    let current_page = query.page.unwrap_or(1).max(1);

    let page = ProductRepository::new(state.db())
        .find_page(current_page, state.config().page_size)
        .await?;

    Ok(ShopIndexTemplate {
        products: page.items.into_iter().map(ProductView::from).collect(),
        page: page.info,
        logged_in: user.is_some(),
    })
}

/// Display a product detail page.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<ProductDetailTemplate> {
    let product = ProductRepository::new(state.db())
        .get(&ProductId::new(id))
        .await?;

    Ok(ProductDetailTemplate {
        product: product.into(),
        logged_in: user.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaAsset;
    use mongodb::bson::oid::ObjectId;
    use rust_decimal::Decimal;

    #[test]
    fn test_product_view_carries_shared_id_and_formatted_price() {
        let oid = ObjectId::new();
        let product = Product {
            id: oid,
            title: "Teapot".to_string(),
            price: Decimal::new(1250, 2),
            description: "A teapot".to_string(),
            image: MediaAsset {
                url: "https://media.example.com/t.jpg".to_string(),
                handle: "t".to_string(),
            },
            user_id: ObjectId::new(),
        };

        let view = ProductView::from(product);

        assert_eq!(view.id, oid.to_hex());
        assert_eq!(view.price, "$12.50");
    }
}
