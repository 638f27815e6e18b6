use crate::errors::ServiceError;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, instrument};
use uuid::Uuid;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// What the checkout path needs from a payment provider: one intent per
/// order, created before the client confirms payment. Settlement outcomes
/// arrive later through the webhook receiver, not through this trait.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider key as it appears in the webhook path, e.g. "stripe".
    fn provider(&self) -> &'static str;

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Charge amount in the currency's minor unit (cents for USD).
    pub amount_minor: i64,
    /// Lowercase ISO 4217 code.
    pub currency: String,
    pub order_id: Uuid,
    pub customer_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Converts a major-unit decimal total to the minor unit the gateway
/// charges in. Rejects amounts that don't fit an i64 after scaling.
pub fn to_minor_units(total: Decimal) -> Result<i64, ServiceError> {
    total
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round())
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| ServiceError::InvalidInput(format!("Amount out of range: {}", total)))
}

/// Stripe PaymentIntents client. Talks to the REST API directly with form
/// encoding; only the two response fields checkout needs are parsed.
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self::with_api_base(secret_key, STRIPE_API_BASE.to_string())
    }

    pub fn with_api_base(secret_key: String, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            api_base,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> &'static str {
        "stripe"
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        let amount = request.amount_minor.to_string();
        let order_id = request.order_id.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("metadata[order_id]", order_id.as_str()),
            ("metadata[customer_email]", request.customer_email.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "payment intent request failed");
                ServiceError::ExternalServiceError("payment gateway unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "payment gateway rejected intent");
            return Err(ServiceError::ExternalServiceError(format!(
                "payment gateway returned {}",
                status
            )));
        }

        response.json::<PaymentIntent>().await.map_err(|e| {
            error!(error = %e, "payment intent response malformed");
            ServiceError::ExternalServiceError("malformed gateway response".to_string())
        })
    }
}
