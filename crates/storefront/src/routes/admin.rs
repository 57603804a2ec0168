//! Admin route handlers: manage your own products.
//!
//! Every handler scopes itself to the signed-in user's products; editing or
//! deleting someone else's product is a 401 even when the id is guessed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use clementine_core::{ProductId, format_usd};

use crate::db::parse_object_id;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::state::AppState;

/// One managed product for the admin list template.
#[derive(Clone)]
pub struct AdminProductView {
    pub id: String,
    pub title: String,
    pub price: String,
}

/// Managed product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub products: Vec<AdminProductView>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    /// `None` for the create form.
    pub product: Option<EditingProduct>,
    pub error: Option<String>,
}

/// Prefilled form values when editing.
#[derive(Clone)]
pub struct EditingProduct {
    pub id: String,
    pub title: String,
    pub price: String,
    pub description: String,
}

/// Parsed multipart product form.
struct ProductForm {
    title: String,
    price: Decimal,
    description: String,
    image: Option<UploadedImage>,
}

struct UploadedImage {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// List the signed-in user's products.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
) -> Result<AdminProductsTemplate> {
    let owner = owner_id(session_user.id.as_str())?;
    let products = ProductRepository::new(state.db()).find_by_owner(owner).await?;

    Ok(AdminProductsTemplate {
        products: products
            .into_iter()
            .map(|p| AdminProductView {
                id: p.id.to_hex(),
                title: p.title,
                price: format_usd(p.price),
            })
            .collect(),
    })
}

/// Display the create form.
pub async fn new_form(RequireAuth(_user): RequireAuth) -> ProductFormTemplate {
    ProductFormTemplate {
        product: None,
        error: None,
    }
}

/// Display the edit form for an owned product.
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Path(id): Path<String>,
) -> Result<ProductFormTemplate> {
    let owner = owner_id(session_user.id.as_str())?;
    let product = ProductRepository::new(state.db())
        .get(&ProductId::new(id))
        .await?;
    ensure_owner(&product, owner)?;

    Ok(ProductFormTemplate {
        product: Some(EditingProduct {
            id: product.id.to_hex(),
            title: product.title,
            price: product.price.to_string(),
            description: product.description,
        }),
        error: None,
    })
}

/// Create a product from the multipart form, uploading its image.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    multipart: Multipart,
) -> Result<Redirect> {
    let owner = owner_id(session_user.id.as_str())?;
    let form = parse_product_form(multipart).await?;

    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("an image is required".to_string()))?;
    let asset = state
        .media()
        .upload(&image.filename, &image.content_type, image.bytes)
        .await?;

    let product = Product {
        id: ObjectId::new(),
        title: form.title,
        price: form.price,
        description: form.description,
        image: asset,
        user_id: owner,
    };

    ProductRepository::new(state.db()).insert(&product).await?;
    tracing::info!(product_id = %product.id, "product created");

    Ok(Redirect::to("/admin/products"))
}

/// Update an owned product; replaces the image only when a new one arrives.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Redirect> {
    let owner = owner_id(session_user.id.as_str())?;
    let repo = ProductRepository::new(state.db());
    let mut product = repo.get(&ProductId::new(id)).await?;
    ensure_owner(&product, owner)?;

    let form = parse_product_form(multipart).await?;
    product.title = form.title;
    product.price = form.price;
    product.description = form.description;

    let old_image = if let Some(image) = form.image {
        let asset = state
            .media()
            .upload(&image.filename, &image.content_type, image.bytes)
            .await?;
        Some(std::mem::replace(&mut product.image, asset))
    } else {
        None
    };

    repo.update(&product).await?;
    tracing::info!(product_id = %product.id, "product updated");

    if let Some(old) = old_image {
        state.media().delete(&old.handle).await;
    }

    Ok(Redirect::to("/admin/products"))
}

/// Delete an owned product and, best-effort, its image.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(session_user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let owner = owner_id(session_user.id.as_str())?;
    let repo = ProductRepository::new(state.db());
    let product_id = ProductId::new(id);

    let product = repo.get(&product_id).await?;
    ensure_owner(&product, owner)?;

    let deleted = repo.delete(&product_id).await?;
    tracing::info!(product_id = %deleted.id, "product deleted");

    state.media().delete(&deleted.image.handle).await;

    Ok(Redirect::to("/admin/products"))
}

fn owner_id(session_id: &str) -> Result<ObjectId> {
    parse_object_id(session_id).map_err(|_| AppError::Unauthorized("invalid session".to_string()))
}

fn ensure_owner(product: &Product, owner: ObjectId) -> Result<()> {
    if product.user_id == owner {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "product belongs to another user".to_string(),
        ))
    }
}

/// Read the multipart product form.
async fn parse_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut title = None;
    let mut price = None;
    let mut description = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form: {e}")))?
    {
        match field.name() {
            Some("title") => {
                title = Some(read_text(field).await?);
            }
            Some("price") => {
                price = Some(read_text(field).await?);
            }
            Some("description") => {
                description = Some(read_text(field).await?);
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("upload").to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;
                // An empty file part means "keep the current image"
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("title is required".to_string()))?;

    let price = price
        .as_deref()
        .and_then(|p| p.trim().parse::<Decimal>().ok())
        .filter(|p| p.is_sign_positive() && !p.is_zero())
        .ok_or_else(|| AppError::BadRequest("price must be a positive amount".to_string()))?;

    let description = description.unwrap_or_default().trim().to_owned();

    Ok(ProductForm {
        title,
        price,
        description,
        image,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form: {e}")))
}
