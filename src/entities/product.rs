use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog product. Immutable after catalog load except by administrative
/// edit; `slug` is the external-facing lookup key, `id` the internal one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[schema(as = Product)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: ProductCategory,
    pub material: ProductMaterial,
    pub base_price: Decimal,
    pub can_engrave: bool,
    pub can_upload_photo: bool,
    pub can_inlay: bool,
    pub production_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Product category enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    #[sea_orm(string_value = "pendant")]
    Pendant,
    #[sea_orm(string_value = "ring")]
    Ring,
    #[sea_orm(string_value = "bracelet")]
    Bracelet,
    #[sea_orm(string_value = "brooch")]
    Brooch,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendant => "pendant",
            Self::Ring => "ring",
            Self::Bracelet => "bracelet",
            Self::Brooch => "brooch",
        }
    }
}

/// Product material enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductMaterial {
    #[sea_orm(string_value = "gold")]
    #[serde(rename = "gold")]
    Gold,
    #[sea_orm(string_value = "silver")]
    #[serde(rename = "silver")]
    Silver,
    #[sea_orm(string_value = "rose-gold")]
    #[serde(rename = "rose-gold")]
    RoseGold,
}

impl ProductMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::RoseGold => "rose-gold",
        }
    }
}
