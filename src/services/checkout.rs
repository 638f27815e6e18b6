use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::catalog::CatalogService;
use crate::services::orders::{NewOrder, OrderService};
use crate::services::payments::{self, PaymentGateway, PaymentIntentRequest};
use crate::services::pricing::{self, LineItemRequest};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Every field is optional at the serde layer so that absent keys fall
/// through to the same invalid-input rejection as empty ones, instead of
/// dying in the JSON extractor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Option<Vec<LineItemRequest>>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub currency: Option<String>,
}

/// What the storefront needs to hand the payment step to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub client_secret: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub estimated_delivery: DateTime<Utc>,
}

/// Composes catalog read, pricing, order write and the gateway call.
///
/// The sequence is deliberately not atomic across the gateway boundary: a
/// gateway failure after the order insert leaves an unpaid `pending` order
/// behind. That orphan is logged, never rolled back, and surfaces to the
/// caller as an upstream failure.
#[derive(Clone)]
pub struct CheckoutService {
    catalog: CatalogService,
    orders: OrderService,
    gateway: Arc<dyn PaymentGateway>,
    default_currency: String,
    event_sender: Option<EventSender>,
}

impl CheckoutService {
    pub fn new(
        catalog: CatalogService,
        orders: OrderService,
        gateway: Arc<dyn PaymentGateway>,
        default_currency: String,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            catalog,
            orders,
            gateway,
            default_currency,
            event_sender,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, ServiceError> {
        let items = match request.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(ServiceError::InvalidInput("No items provided".to_string())),
        };
        let (customer_email, shipping_address) =
            match (request.customer_email, request.shipping_address) {
                (Some(email), Some(address)) if !email.trim().is_empty() => (email, address),
                _ => {
                    return Err(ServiceError::InvalidInput(
                        "Customer email and shipping address are required".to_string(),
                    ))
                }
            };

        let currency = request
            .currency
            .unwrap_or_else(|| self.default_currency.clone());

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let snapshot = self.catalog.snapshot_for(&product_ids).await?;
        let quote = pricing::price_items(&snapshot, &items)?;

        let (order, _items) = self
            .orders
            .create_order(
                NewOrder {
                    customer_email: customer_email.clone(),
                    currency: currency.clone(),
                    shipping_address,
                },
                &quote,
            )
            .await?;

        let intent_request = PaymentIntentRequest {
            amount_minor: payments::to_minor_units(quote.total_amount)?,
            currency: currency.to_lowercase(),
            order_id: order.id,
            customer_email,
        };

        let intent = match self.gateway.create_payment_intent(&intent_request).await {
            Ok(intent) => intent,
            Err(e) => {
                // The unpaid pending order stays behind; there is no
                // reconciliation job, so make the orphan easy to find.
                warn!(order_id = %order.id, "payment intent creation failed, order left unpaid");
                return Err(e);
            }
        };

        self.orders.set_payment_intent(order.id, &intent.id).await?;

        let estimated_delivery = Utc::now() + Duration::days(quote.max_production_days());

        info!(order_id = %order.id, intent_id = %intent.id, "checkout completed");
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::CheckoutCompleted {
                    order_id: order.id,
                    payment_intent_id: intent.id.clone(),
                })
                .await
            {
                error!("Failed to send event: {}", e);
            }
        }

        Ok(CheckoutReceipt {
            order_id: order.id,
            client_secret: intent.client_secret,
            total_amount: quote.total_amount,
            currency,
            estimated_delivery,
        })
    }
}
