use crate::entities::{order, order_item, Order, OrderItem, Product};
use crate::entities::order::{FulfillmentStatus, PaymentStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing::Quote;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Shipping buffer added on top of production lead time when payment
/// success fixes the delivery estimate.
const SHIPPING_BUFFER_DAYS: i64 = 7;

/// Statuses an operator may set through the update endpoint. `pending` is
/// checkout-only and deliberately absent.
const STATUS_ALLOW_LIST: [FulfillmentStatus; 6] = [
    FulfillmentStatus::Processing,
    FulfillmentStatus::Production,
    FulfillmentStatus::QualityCheck,
    FulfillmentStatus::Shipped,
    FulfillmentStatus::Delivered,
    FulfillmentStatus::Cancelled,
];

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_email: String,
    pub currency: String,
    pub shipping_address: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// One of: processing, production, quality-check, shipped, delivered,
    /// cancelled.
    pub status: Option<String>,
    pub tracking_number: Option<String>,
}

pub type OrderWithItems = (order::Model, Vec<order_item::Model>);

/// Owns every write to orders and their line items. Prices land here frozen
/// from a [`Quote`]; later transitions never touch the money columns.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                error!("Failed to send event: {}", e);
            }
        }
    }

    /// Creates the order row and its line items in one transaction. The
    /// order starts `pending`/`unpaid` with no payment-intent reference and
    /// no delivery estimate.
    #[instrument(skip(self, new_order, quote), fields(customer_email = %new_order.customer_email))]
    pub async fn create_order(
        &self,
        new_order: NewOrder,
        quote: &Quote,
    ) -> Result<OrderWithItems, ServiceError> {
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            customer_email: Set(new_order.customer_email),
            currency: Set(new_order.currency),
            subtotal: Set(quote.subtotal),
            shipping_amount: Set(quote.shipping_amount),
            tax_amount: Set(quote.tax_amount),
            total_amount: Set(quote.total_amount),
            shipping_address: Set(new_order.shipping_address),
            status: Set(FulfillmentStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            payment_intent_id: Set(None),
            tracking_number: Set(None),
            estimated_delivery: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let item_models: Vec<order_item::ActiveModel> = quote
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                product_name: Set(item.product_name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total_price: Set(item.total_price),
                customization: Set(item.customization.clone()),
                created_at: Set(now),
            })
            .collect();

        let txn = self.db.begin().await?;
        let saved = order_model.insert(&txn).await?;
        for item in item_models {
            item.insert(&txn).await?;
        }
        txn.commit().await?;

        info!(order_id = %order_id, total = %saved.total_amount, "order created");
        self.emit(Event::OrderCreated(order_id)).await;

        let items = self.items_of(order_id).await?;
        Ok((saved, items))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {}", order_id)))?;
        let items = self.items_of(order_id).await?;
        Ok((order, items))
    }

    async fn items_of(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        Ok(OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(self.db.as_ref())
            .await?)
    }

    /// Stores the gateway's intent reference once checkout has one.
    #[instrument(skip(self))]
    pub async fn set_payment_intent(
        &self,
        order_id: Uuid,
        payment_intent_id: &str,
    ) -> Result<(), ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {}", order_id)))?;

        let mut active: order::ActiveModel = order.into();
        active.payment_intent_id = Set(Some(payment_intent_id.to_string()));
        active.updated_at = Set(Utc::now());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    /// Operator-driven status/tracking update. An unknown status string is
    /// rejected before any write, and `cancelled` is refused once the order
    /// has shipped.
    #[instrument(skip(self, update))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        update: OrderUpdate,
    ) -> Result<OrderWithItems, ServiceError> {
        let new_status = update
            .status
            .as_deref()
            .map(parse_allowed_status)
            .transpose()?;

        let order = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {}", order_id)))?;

        if let Some(status) = new_status {
            if status == FulfillmentStatus::Cancelled && !order.status.is_pre_shipment() {
                return Err(ServiceError::InvalidStatus(format!(
                    "cannot cancel an order that is already {}",
                    order.status.as_str()
                )));
            }
        }

        let old_status = order.status;
        let mut active: order::ActiveModel = order.into();
        if let Some(status) = new_status {
            active.status = Set(status);
        }
        if let Some(tracking_number) = update.tracking_number {
            active.tracking_number = Set(Some(tracking_number));
        }
        active.updated_at = Set(Utc::now());
        let saved = active.update(self.db.as_ref()).await?;

        if let Some(status) = new_status {
            if status != old_status {
                self.emit(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.as_str().to_string(),
                    new_status: status.as_str().to_string(),
                })
                .await;
            }
        }

        let items = self.items_of(order_id).await?;
        Ok((saved, items))
    }

    /// Applies a confirmed payment: `paid`/`processing`, and the delivery
    /// estimate becomes now + longest item lead time + shipping buffer.
    /// Safe to apply twice for the same order; gateway retries are expected.
    #[instrument(skip(self))]
    pub async fn record_payment_success(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {}", order_id)))?;

        let max_days = self.max_production_days(order_id).await?;
        let estimated_delivery = Utc::now() + Duration::days(max_days + SHIPPING_BUFFER_DAYS);

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.status = Set(FulfillmentStatus::Processing);
        active.estimated_delivery = Set(Some(estimated_delivery));
        active.updated_at = Set(Utc::now());
        let saved = active.update(self.db.as_ref()).await?;

        info!(order_id = %order_id, %estimated_delivery, "payment succeeded");
        self.emit(Event::PaymentSucceeded(order_id)).await;
        Ok(saved)
    }

    /// Applies a failed payment: `failed`/`cancelled`. Never sets a delivery
    /// estimate.
    #[instrument(skip(self))]
    pub async fn record_payment_failure(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {}", order_id)))?;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Failed);
        active.status = Set(FulfillmentStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let saved = active.update(self.db.as_ref()).await?;

        warn!(order_id = %order_id, "payment failed, order cancelled");
        self.emit(Event::PaymentFailed(order_id)).await;
        Ok(saved)
    }

    /// Longest production lead time across the order's items, read from the
    /// current product rows.
    async fn max_production_days(&self, order_id: Uuid) -> Result<i64, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .find_also_related(Product)
            .all(self.db.as_ref())
            .await?;

        Ok(items
            .iter()
            .filter_map(|(_, product)| product.as_ref())
            .map(|p| i64::from(p.production_days))
            .max()
            .unwrap_or(0))
    }
}

fn parse_allowed_status(value: &str) -> Result<FulfillmentStatus, ServiceError> {
    STATUS_ALLOW_LIST
        .iter()
        .copied()
        .find(|status| status.as_str() == value)
        .ok_or_else(|| ServiceError::InvalidStatus(value.to_string()))
}
