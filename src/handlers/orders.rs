use crate::entities::{order, order_item};
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::services::orders::OrderUpdate;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: OrderView,
}

impl OrderResponse {
    fn from_parts((order, items): (order::Model, Vec<order_item::Model>)) -> Self {
        Self {
            order: OrderView { order, items },
        }
    }
}

/// GET /api/orders/:id
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with line items", body = OrderResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderResponse::from_parts(order)))
}

/// PATCH /api/orders/:id
#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = OrderUpdate,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Status outside the allow-list", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<OrderUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_order(id, update)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(OrderResponse::from_parts(order)))
}
