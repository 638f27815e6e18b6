use crate::entities::{
    inlay_option, product, product_variant, InlayOption, Product, ProductVariant,
};
use crate::entities::product::{ProductCategory, ProductMaterial};
use crate::errors::ServiceError;
use crate::services::pricing::CatalogSnapshot;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query parameters accepted by the product listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub material: Option<ProductMaterial>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only `true` narrows the listing; `false` is treated as unset.
    pub can_engrave: Option<bool>,
    pub can_upload_photo: Option<bool>,
    pub sort: Option<ProductSort>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Recommended,
    PriceAsc,
    PriceDesc,
    Name,
}

/// One value of a listing facet with the number of catalog products carrying
/// it. Counted over the whole catalog, not the filtered subset, so a UI can
/// always offer every filter choice.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FacetCount {
    pub id: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogFacets {
    pub categories: Vec<FacetCount>,
    pub materials: Vec<FacetCount>,
}

#[derive(Debug)]
pub struct ProductListing {
    pub products: Vec<(product::Model, Vec<product_variant::Model>)>,
    pub facets: CatalogFacets,
}

/// Read access to products, variants and inlay options. The checkout path
/// only ever reads through [`CatalogService::snapshot_for`].
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<ProductListing, ServiceError> {
        let mut query = Product::find();

        if let Some(category) = filter.category {
            query = query.filter(product::Column::Category.eq(category));
        }
        if let Some(material) = filter.material {
            query = query.filter(product::Column::Material.eq(material));
        }
        if let Some(min_price) = filter.min_price {
            query = query.filter(product::Column::BasePrice.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(product::Column::BasePrice.lte(max_price));
        }
        if filter.can_engrave == Some(true) {
            query = query.filter(product::Column::CanEngrave.eq(true));
        }
        if filter.can_upload_photo == Some(true) {
            query = query.filter(product::Column::CanUploadPhoto.eq(true));
        }

        query = match filter.sort.unwrap_or_default() {
            ProductSort::Recommended => query.order_by_desc(product::Column::CreatedAt),
            ProductSort::PriceAsc => query.order_by_asc(product::Column::BasePrice),
            ProductSort::PriceDesc => query.order_by_desc(product::Column::BasePrice),
            ProductSort::Name => query.order_by_asc(product::Column::Name),
        };

        let products = query
            .find_with_related(ProductVariant)
            .all(self.db.as_ref())
            .await?;

        let facets = self.facets().await?;

        Ok(ProductListing { products, facets })
    }

    /// Facet counts over the entire catalog.
    async fn facets(&self) -> Result<CatalogFacets, ServiceError> {
        let rows: Vec<(ProductCategory, ProductMaterial)> = Product::find()
            .select_only()
            .column(product::Column::Category)
            .column(product::Column::Material)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let mut categories: HashMap<String, u64> = HashMap::new();
        let mut materials: HashMap<String, u64> = HashMap::new();
        for (category, material) in rows {
            *categories.entry(category.as_str().to_string()).or_default() += 1;
            *materials.entry(material.as_str().to_string()).or_default() += 1;
        }

        Ok(CatalogFacets {
            categories: facet_counts(categories),
            materials: facet_counts(materials),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<(product::Model, Vec<product_variant::Model>), ServiceError> {
        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found: {}", slug)))?;

        let variants = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product.id))
            .order_by_asc(product_variant::Column::PriceDelta)
            .all(self.db.as_ref())
            .await?;

        Ok((product, variants))
    }

    #[instrument(skip(self))]
    pub async fn list_inlay_options(&self) -> Result<Vec<inlay_option::Model>, ServiceError> {
        Ok(InlayOption::find()
            .order_by_asc(inlay_option::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    /// Takes the catalog read a pricing computation runs against: the named
    /// products with their variants, plus every inlay option.
    #[instrument(skip(self))]
    pub async fn snapshot_for(&self, product_ids: &[Uuid]) -> Result<CatalogSnapshot, ServiceError> {
        let products = Product::find()
            .filter(product::Column::Id.is_in(product_ids.to_vec()))
            .find_with_related(ProductVariant)
            .all(self.db.as_ref())
            .await?;

        let inlays = InlayOption::find().all(self.db.as_ref()).await?;

        let mut snapshot = CatalogSnapshot::default();
        for (product, variants) in products {
            snapshot.variants_by_product.insert(product.id, variants);
            snapshot.products.insert(product.id, product);
        }
        for inlay in inlays {
            snapshot.inlay_options.insert(inlay.id, inlay);
        }

        Ok(snapshot)
    }
}

fn facet_counts(counts: HashMap<String, u64>) -> Vec<FacetCount> {
    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(value, count)| FacetCount {
            id: value.clone(),
            name: value,
            count,
        })
        .collect();
    facets.sort_by(|a, b| a.id.cmp(&b.id));
    facets
}

struct SeedProduct {
    slug: &'static str,
    name: &'static str,
    category: ProductCategory,
    material: ProductMaterial,
    base_price: Decimal,
    description: &'static str,
    can_engrave: bool,
    can_upload_photo: bool,
    can_inlay: bool,
    production_days: i32,
}

/// Loads the demo catalog: idempotent by slug/name, so re-running against a
/// populated database inserts nothing.
pub async fn seed_demo_catalog(db: &DatabaseConnection) -> Result<(), ServiceError> {
    let inlays = [
        ("Diamond", dec!(150), "#ffffff"),
        ("Sapphire", dec!(120), "#0f4c81"),
        ("Ruby", dec!(130), "#e0115f"),
        ("Emerald", dec!(125), "#50c878"),
        ("Birthstone", dec!(100), "#ffd700"),
    ];

    for (name, price, color) in inlays {
        let existing = InlayOption::find()
            .filter(inlay_option::Column::Name.eq(name))
            .one(db)
            .await?;
        if existing.is_none() {
            inlay_option::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                price: Set(price),
                color: Set(Some(color.to_string())),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await?;
        }
    }

    let products = [
        SeedProduct {
            slug: "golden-companion-pendant",
            name: "Golden Companion Pendant",
            category: ProductCategory::Pendant,
            material: ProductMaterial::Gold,
            base_price: dec!(289),
            description: "A timeless 18K gold pendant featuring an elegant dog silhouette. Perfect for keeping your beloved companion close to your heart.",
            can_engrave: true,
            can_upload_photo: true,
            can_inlay: true,
            production_days: 14,
        },
        SeedProduct {
            slug: "rose-whiskers-ring",
            name: "Rose Whiskers Ring",
            category: ProductCategory::Ring,
            material: ProductMaterial::RoseGold,
            base_price: dec!(349),
            description: "A delicate rose gold ring with cat silhouette engraving and optional birthstone. A subtle reminder of your feline friend.",
            can_engrave: true,
            can_upload_photo: false,
            can_inlay: true,
            production_days: 12,
        },
        SeedProduct {
            slug: "silver-paw-bracelet",
            name: "Silver Paw Bracelet",
            category: ProductCategory::Bracelet,
            material: ProductMaterial::Silver,
            base_price: dec!(199),
            description: "Sterling silver chain bracelet with paw print charm. A timeless piece to celebrate the bond with your pet.",
            can_engrave: true,
            can_upload_photo: false,
            can_inlay: false,
            production_days: 10,
        },
        SeedProduct {
            slug: "golden-portrait-brooch",
            name: "Golden Portrait Brooch",
            category: ProductCategory::Brooch,
            material: ProductMaterial::Gold,
            base_price: dec!(459),
            description: "Exquisite 18K gold brooch featuring a custom pet portrait with diamond accent. A true heirloom piece.",
            can_engrave: true,
            can_upload_photo: true,
            can_inlay: true,
            production_days: 21,
        },
        SeedProduct {
            slug: "feline-grace-pendant",
            name: "Feline Grace Pendant",
            category: ProductCategory::Pendant,
            material: ProductMaterial::RoseGold,
            base_price: dec!(319),
            description: "Rose gold pendant with elegant cat silhouette and optional precious stones. Perfect for cat lovers.",
            can_engrave: true,
            can_upload_photo: true,
            can_inlay: true,
            production_days: 14,
        },
        SeedProduct {
            slug: "loyal-friend-ring",
            name: "Loyal Friend Ring",
            category: ProductCategory::Ring,
            material: ProductMaterial::Silver,
            base_price: dec!(249),
            description: "Sterling silver ring with Labrador engraving and sapphire accent. For those who treasure their loyal companions.",
            can_engrave: true,
            can_upload_photo: false,
            can_inlay: true,
            production_days: 12,
        },
    ];

    for seed in products {
        let existing = Product::find()
            .filter(product::Column::Slug.eq(seed.slug))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(seed.slug.to_string()),
            name: Set(seed.name.to_string()),
            description: Set(seed.description.to_string()),
            category: Set(seed.category),
            material: Set(seed.material),
            base_price: Set(seed.base_price),
            can_engrave: Set(seed.can_engrave),
            can_upload_photo: Set(seed.can_upload_photo),
            can_inlay: Set(seed.can_inlay),
            production_days: Set(seed.production_days),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        // Sized pieces carry S/M/L variants; pendants and brooches are one-size.
        if matches!(seed.category, ProductCategory::Ring | ProductCategory::Bracelet) {
            for (size, delta) in [("S", dec!(-10)), ("M", dec!(0)), ("L", dec!(10))] {
                product_variant::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product.id),
                    name: Set(size.to_string()),
                    price_delta: Set(delta),
                    created_at: Set(now),
                }
                .insert(db)
                .await?;
            }
        }

        info!(slug = seed.slug, "seeded product");
    }

    Ok(())
}
