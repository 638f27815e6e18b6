use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::catalog::CatalogService;
use crate::services::checkout::CheckoutService;
use crate::services::orders::OrderService;
use crate::services::payments::PaymentGateway;
use crate::services::uploads::UploadService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod checkout;
pub mod common;
pub mod orders;
pub mod products;
pub mod uploads;
pub mod webhooks;

/// All service instances, constructed once at startup and cloned into the
/// router state. No handler touches the database directly.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub checkout: CheckoutService,
    pub uploads: UploadService,
}

impl AppServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let catalog = CatalogService::new(db.clone());
        let orders = OrderService::new(db.clone(), event_sender.clone());
        let checkout = CheckoutService::new(
            catalog.clone(),
            orders.clone(),
            gateway,
            config.default_currency.clone(),
            event_sender.clone(),
        );
        let uploads = UploadService::new(
            db,
            config.upload_dir.clone(),
            config.upload_base_url.clone(),
            event_sender,
        );

        Self {
            catalog,
            orders,
            checkout,
            uploads,
        }
    }
}
