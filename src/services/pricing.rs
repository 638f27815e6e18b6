use crate::entities::{inlay_option, product, product_variant};
use crate::errors::ServiceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Subtotal at or above this (in the order currency's major unit) ships free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(300);
/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Decimal = dec!(25);
/// Placeholder flat tax rate. This is NOT a real tax-jurisdiction
/// calculation; a production deployment needs a proper tax service.
pub const PLACEHOLDER_TAX_RATE: Decimal = dec!(0.10);

/// One requested product (+ optional variant/customization) with a quantity,
/// as submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: Option<i32>,
    /// Opaque customization payload; an `inlay` key naming an inlay option id
    /// participates in pricing, everything else passes through untouched.
    pub customization: Option<serde_json::Value>,
}

/// Read of catalog state taken at the start of a pricing computation.
/// Prices derived from it are frozen onto the order.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub products: HashMap<Uuid, product::Model>,
    pub variants_by_product: HashMap<Uuid, Vec<product_variant::Model>>,
    pub inlay_options: HashMap<Uuid, inlay_option::Model>,
}

impl CatalogSnapshot {
    fn product(&self, id: Uuid) -> Option<&product::Model> {
        self.products.get(&id)
    }

    fn variant(&self, product_id: Uuid, variant_id: Uuid) -> Option<&product_variant::Model> {
        self.variants_by_product
            .get(&product_id)
            .and_then(|variants| variants.iter().find(|v| v.id == variant_id))
    }

    fn inlay(&self, id: Uuid) -> Option<&inlay_option::Model> {
        self.inlay_options.get(&id)
    }
}

/// A line item with its price frozen against the snapshot.
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub customization: Option<serde_json::Value>,
    pub production_days: i32,
}

/// Result of pricing a set of line items. Satisfies
/// `total_amount = subtotal + shipping_amount + tax_amount` exactly.
#[derive(Debug, Clone)]
pub struct Quote {
    pub items: Vec<PricedItem>,
    pub subtotal: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl Quote {
    /// Longest production lead time across all items, in days.
    pub fn max_production_days(&self) -> i64 {
        self.items
            .iter()
            .map(|item| i64::from(item.production_days))
            .max()
            .unwrap_or(0)
    }
}

/// Prices the requested line items against a catalog snapshot.
///
/// Unit price = base price + variant delta (when a variant is selected)
/// + inlay price (when the customization names a resolvable inlay id).
/// An unresolved inlay id is ignored; a variant id that does not belong to
/// the product is rejected. Any unknown product id aborts the whole
/// computation with no partial result.
pub fn price_items(
    snapshot: &CatalogSnapshot,
    items: &[LineItemRequest],
) -> Result<Quote, ServiceError> {
    let mut priced = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for item in items {
        let product = snapshot.product(item.product_id).ok_or_else(|| {
            ServiceError::InvalidInput(format!("Product not found: {}", item.product_id))
        })?;

        let mut unit_price = product.base_price;

        if let Some(variant_id) = item.variant_id {
            let variant = snapshot.variant(product.id, variant_id).ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "Variant {} does not belong to product {}",
                    variant_id, product.id
                ))
            })?;
            unit_price += variant.price_delta;
        }

        if let Some(inlay_id) = requested_inlay(item.customization.as_ref()) {
            if let Some(inlay) = snapshot.inlay(inlay_id) {
                unit_price += inlay.price;
            }
        }

        let quantity = item.quantity.filter(|q| *q >= 1).unwrap_or(1);
        let total_price = unit_price * Decimal::from(quantity);
        subtotal += total_price;

        priced.push(PricedItem {
            product_id: product.id,
            variant_id: item.variant_id,
            product_name: product.name.clone(),
            quantity,
            unit_price,
            total_price,
            customization: item.customization.clone(),
            production_days: product.production_days,
        });
    }

    let shipping_amount = if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    let tax_amount = (subtotal * PLACEHOLDER_TAX_RATE).round_dp(2);
    let total_amount = subtotal + shipping_amount + tax_amount;

    Ok(Quote {
        items: priced,
        subtotal,
        shipping_amount,
        tax_amount,
        total_amount,
    })
}

/// Pulls the inlay option id out of a customization payload, if present and
/// well-formed. Malformed ids are treated the same as absent ones.
fn requested_inlay(customization: Option<&serde_json::Value>) -> Option<Uuid> {
    customization?
        .get("inlay")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}
