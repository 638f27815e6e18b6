use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order ledger row. Created once per checkout attempt; mutated only through
/// the fulfillment/payment transitions. Money columns satisfy
/// `total_amount = subtotal + shipping_amount + tax_amount` at all times and
/// are never touched by status writes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = Order)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_email: String,
    pub currency: String,
    pub subtotal: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Json")]
    pub shipping_address: Json,
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    /// Gateway payment-intent reference; null until the gateway call succeeds
    pub payment_intent_id: Option<String>,
    pub tracking_number: Option<String>,
    /// Null until payment success recomputes it authoritatively
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Position in the production/shipping pipeline, distinct from payment
/// status. Forward progress past `processing` is operator-driven.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum FulfillmentStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    #[serde(rename = "processing")]
    Processing,
    #[sea_orm(string_value = "production")]
    #[serde(rename = "production")]
    Production,
    #[sea_orm(string_value = "quality-check")]
    #[serde(rename = "quality-check")]
    QualityCheck,
    #[sea_orm(string_value = "shipped")]
    #[serde(rename = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    #[serde(rename = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl FulfillmentStatus {
    /// Whether the order is still before the shipped stage. `cancelled` is
    /// only reachable from these states.
    pub fn is_pre_shipment(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Processing | Self::Production | Self::QualityCheck
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Production => "production",
            Self::QualityCheck => "quality-check",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Payment status enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "unpaid")]
    #[serde(rename = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    #[serde(rename = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    Failed,
}
