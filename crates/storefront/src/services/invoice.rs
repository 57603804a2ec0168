//! Invoice generation.
//!
//! Renders a PDF invoice from an order snapshot. Amounts come from the
//! snapshot alone, so an invoice downloaded years later still shows the
//! prices paid, not today's catalog.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_decimal::Decimal;
use thiserror::Error;

use clementine_core::format_usd;

use crate::error::AppError;
use crate::models::{Order, OrderItem};

/// Errors from invoice rendering.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// PDF assembly failed.
    #[error("pdf generation failed: {0}")]
    Pdf(String),
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// GST rate applied to every invoice: 18%.
fn tax_rate() -> Decimal {
    Decimal::new(18, 2)
}

/// Monetary breakdown of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// GST on the subtotal, rounded to cents.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
}

/// Compute the invoice totals for an order.
#[must_use]
pub fn compute_totals(order: &Order) -> InvoiceTotals {
    let subtotal: Decimal = order.items.iter().map(OrderItem::line_total).sum();
    let tax = (subtotal * tax_rate()).round_dp(2);
    let total = subtotal + tax;

    InvoiceTotals {
        subtotal,
        tax,
        total,
    }
}

/// Reject invoice access for anyone but the order's buyer.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when `user_id` is not the buyer.
pub fn ensure_owner(order: &Order, user_id: mongodb::bson::oid::ObjectId) -> Result<(), AppError> {
    if order.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "invoice belongs to another user".to_string(),
        ))
    }
}

// A4 geometry in millimeters.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const TOP_Y: f32 = 270.0;
const BOTTOM_Y: f32 = 30.0;
const LINE_HEIGHT: f32 = 8.0;

/// Render the order's invoice as PDF bytes.
///
/// # Errors
///
/// Returns `InvoiceError::Pdf` if document assembly fails.
pub fn render(order: &Order) -> Result<Vec<u8>, InvoiceError> {
    let totals = compute_totals(order);
    let order_id = order.order_id();

    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {order_id}"),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Pdf(e.to_string()))?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = TOP_Y;

    layer.use_text("Clementine", 14.0, Mm(MARGIN_LEFT), Mm(y), &font_bold);
    y -= LINE_HEIGHT;
    layer.use_text("Invoice", 24.0, Mm(MARGIN_LEFT), Mm(y), &font_bold);
    y -= LINE_HEIGHT * 1.5;
    layer.use_text(
        format!("Invoice #{order_id}"),
        11.0,
        Mm(MARGIN_LEFT),
        Mm(y),
        &font,
    );
    y -= LINE_HEIGHT;
    let issued = order.placed_at.try_to_rfc3339_string().unwrap_or_default();
    layer.use_text(
        format!("Issued: {issued}"),
        11.0,
        Mm(MARGIN_LEFT),
        Mm(y),
        &font,
    );
    y -= LINE_HEIGHT;
    layer.use_text(
        format!("Billed to: {}", order.email),
        11.0,
        Mm(MARGIN_LEFT),
        Mm(y),
        &font,
    );
    y -= LINE_HEIGHT * 2.0;

    for item in &order.items {
        if y < BOTTOM_Y {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(next_page).get_layer(next_layer);
            y = TOP_Y;
        }

        let line = format!(
            "{} [{}] - {} x {}",
            item.product.title,
            item.product.product_id.to_hex(),
            item.quantity,
            format_usd(item.product.price)
        );
        layer.use_text(line, 11.0, Mm(MARGIN_LEFT), Mm(y), &font);
        layer.use_text(
            format_usd(item.line_total()),
            11.0,
            Mm(160.0),
            Mm(y),
            &font,
        );
        y -= LINE_HEIGHT;
    }

    y -= LINE_HEIGHT;
    layer.use_text("Subtotal", 11.0, Mm(MARGIN_LEFT), Mm(y), &font);
    layer.use_text(format_usd(totals.subtotal), 11.0, Mm(160.0), Mm(y), &font);
    y -= LINE_HEIGHT;
    layer.use_text("GST (18%)", 11.0, Mm(MARGIN_LEFT), Mm(y), &font);
    layer.use_text(format_usd(totals.tax), 11.0, Mm(160.0), Mm(y), &font);
    y -= LINE_HEIGHT;
    layer.use_text("Total", 12.0, Mm(MARGIN_LEFT), Mm(y), &font_bold);
    layer.use_text(
        format_usd(totals.total),
        12.0,
        Mm(160.0),
        Mm(y),
        &font_bold,
    );

    doc.save_to_bytes()
        .map_err(|e| InvoiceError::Pdf(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::ProductSnapshot;
    use mongodb::bson::DateTime;
    use mongodb::bson::oid::ObjectId;

    fn order_with(lines: Vec<(Decimal, u32)>) -> Order {
        Order {
            id: ObjectId::new(),
            checkout_session_id: "cs_test_inv".to_string(),
            email: "buyer@example.com".to_string(),
            user_id: ObjectId::new(),
            shipping_address: None,
            items: lines
                .into_iter()
                .enumerate()
                .map(|(i, (price, quantity))| OrderItem {
                    product: ProductSnapshot {
                        product_id: ObjectId::new(),
                        title: format!("Item {i}"),
                        price,
                    },
                    quantity,
                })
                .collect(),
            placed_at: DateTime::now(),
        }
    }

    #[test]
    fn test_totals_apply_18_percent_gst() {
        // 2 x 100.00 + 1 x 50.00 = 250.00, GST 45.00, total 295.00
        let order = order_with(vec![(Decimal::new(10000, 2), 2), (Decimal::new(5000, 2), 1)]);

        let totals = compute_totals(&order);

        assert_eq!(totals.subtotal, Decimal::new(25000, 2));
        assert_eq!(totals.tax, Decimal::new(4500, 2));
        assert_eq!(totals.total, Decimal::new(29500, 2));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        // 18% of 0.33 is 0.0594, rounded to 0.06
        let order = order_with(vec![(Decimal::new(33, 2), 1)]);

        let totals = compute_totals(&order);

        assert_eq!(totals.tax, Decimal::new(6, 2));
        assert_eq!(totals.total, Decimal::new(39, 2));
    }

    #[test]
    fn test_ensure_owner_accepts_buyer() {
        let order = order_with(vec![(Decimal::ONE, 1)]);
        assert!(ensure_owner(&order, order.user_id).is_ok());
    }

    #[test]
    fn test_ensure_owner_rejects_other_user() {
        let order = order_with(vec![(Decimal::ONE, 1)]);
        assert!(matches!(
            ensure_owner(&order, ObjectId::new()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let order = order_with(vec![(Decimal::new(1250, 2), 2)]);

        let bytes = render(&order).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }
}
