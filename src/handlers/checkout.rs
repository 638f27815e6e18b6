use crate::errors::ApiError;
use crate::handlers::common::{created_response, map_service_error};
use crate::services::checkout::{CheckoutReceipt, CheckoutRequest};
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// POST /api/checkout
///
/// Prices the cart, writes the order, creates the payment intent and hands
/// the client secret back so the client can confirm payment.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created, payment intent pending confirmation", body = CheckoutReceipt),
        (status = 400, description = "Missing items/email/address or unknown product", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .checkout
        .checkout(request)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(receipt))
}
