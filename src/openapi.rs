use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier Storefront API",
        description = "Custom-jewelry storefront: catalog browsing, per-item customization, checkout with payment intents, order tracking, photo uploads and payment webhooks.",
    ),
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::checkout::checkout,
        handlers::orders::get_order,
        handlers::orders::update_order,
        handlers::uploads::upload_asset,
        handlers::webhooks::gateway_webhook,
    ),
    components(schemas(
        ErrorResponse,
        entities::product::Model,
        entities::product::ProductCategory,
        entities::product::ProductMaterial,
        entities::product_variant::Model,
        entities::inlay_option::Model,
        entities::order::Model,
        entities::order::FulfillmentStatus,
        entities::order::PaymentStatus,
        entities::order_item::Model,
        entities::uploaded_asset::Model,
        entities::uploaded_asset::AssetStatus,
        services::pricing::LineItemRequest,
        services::checkout::CheckoutRequest,
        services::checkout::CheckoutReceipt,
        services::orders::OrderUpdate,
        services::catalog::FacetCount,
        services::catalog::CatalogFacets,
        services::catalog::ProductSort,
        handlers::products::ProductListResponse,
        handlers::products::ProductSummary,
        handlers::products::ProductDetailResponse,
        handlers::products::ProductDetail,
        handlers::products::CustomizationOptions,
        handlers::products::EngraveOptions,
        handlers::products::PhotoOptions,
        handlers::orders::OrderResponse,
        handlers::orders::OrderView,
        handlers::uploads::UploadResponse,
    )),
    tags(
        (name = "Catalog", description = "Product browsing and filtering"),
        (name = "Checkout", description = "Cart pricing and payment intent creation"),
        (name = "Orders", description = "Order status tracking and operator updates"),
        (name = "Uploads", description = "Customer photo intake"),
        (name = "Webhooks", description = "Payment gateway callbacks"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document at
/// /api-docs/openapi.json.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
