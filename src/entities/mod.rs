pub mod inlay_option;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;
pub mod uploaded_asset;

pub use inlay_option::Entity as InlayOption;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use product_variant::Entity as ProductVariant;
pub use uploaded_asset::Entity as UploadedAsset;
