use crate::entities::{inlay_option, product, product_variant};
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::catalog::{CatalogFacets, ProductFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: product::Model,
    pub variants: Vec<product_variant::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductSummary>,
    pub filters: CatalogFacets,
}

/// Customization surfaces offered for a product, shaped by its flags. A
/// `null` section means the product does not support that customization.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationOptions {
    pub engrave: Option<EngraveOptions>,
    pub photo: Option<PhotoOptions>,
    pub inlay: Option<Vec<inlay_option::Model>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngraveOptions {
    pub max_length: u32,
    pub allowed_characters: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoOptions {
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: u32,
    pub allowed_formats: Vec<&'static str>,
    pub min_resolution: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub variants: Vec<product_variant::Model>,
    pub customization_options: CustomizationOptions,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    pub product: ProductDetail,
}

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Filtered product listing with facet counts", body = ProductListResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .services
        .catalog
        .list_products(&filter)
        .await
        .map_err(map_service_error)?;

    let products = listing
        .products
        .into_iter()
        .map(|(product, variants)| ProductSummary { product, variants })
        .collect();

    Ok(success_response(ProductListResponse {
        products,
        filters: listing.facets,
    }))
}

/// GET /api/products/:slug
#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product with customization options", body = ProductDetailResponse),
        (status = 404, description = "Unknown slug", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (product, variants) = state
        .services
        .catalog
        .get_product_by_slug(&slug)
        .await
        .map_err(map_service_error)?;

    let inlays = if product.can_inlay {
        Some(
            state
                .services
                .catalog
                .list_inlay_options()
                .await
                .map_err(map_service_error)?,
        )
    } else {
        None
    };

    let customization_options = CustomizationOptions {
        engrave: product.can_engrave.then_some(EngraveOptions {
            max_length: 20,
            allowed_characters: "alphanumeric",
        }),
        photo: product.can_upload_photo.then_some(PhotoOptions {
            max_size_mb: 10,
            allowed_formats: vec!["jpg", "png", "heic"],
            min_resolution: 1500,
        }),
        inlay: inlays,
    };

    Ok(success_response(ProductDetailResponse {
        product: ProductDetail {
            product,
            variants,
            customization_options,
        },
    }))
}
