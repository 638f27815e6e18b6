#![allow(dead_code)]

use async_trait::async_trait;
use atelier_api::config::AppConfig;
use atelier_api::db;
use atelier_api::errors::ServiceError;
use atelier_api::services::catalog::seed_demo_catalog;
use atelier_api::services::payments::{PaymentGateway, PaymentIntent, PaymentIntentRequest};
use atelier_api::{app_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::Value;
use sha2::Sha256;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Payment gateway double. Records every intent request and can be flipped
/// into failure mode mid-test.
pub struct MockGateway {
    fail: AtomicBool,
    requests: Mutex<Vec<PaymentIntentRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PaymentIntentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider(&self) -> &'static str {
        "stripe"
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::ExternalServiceError(
                "mock gateway down".to_string(),
            ));
        }
        Ok(PaymentIntent {
            id: format!("pi_{}", request.order_id.simple()),
            client_secret: format!("pi_{}_secret_test", request.order_id.simple()),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DatabaseConnection>,
    pub gateway: Arc<MockGateway>,
    // Held so uploads written during a test are cleaned up with it.
    _upload_dir: tempfile::TempDir,
}

impl TestApp {
    /// In-memory database with the demo catalog loaded and a mock gateway.
    pub async fn spawn() -> Self {
        // A single connection keeps every query on the same in-memory
        // database.
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1);
        let db = Arc::new(Database::connect(options).await.expect("connect sqlite"));

        db::ensure_schema(&db).await.expect("create schema");
        seed_demo_catalog(&db).await.expect("seed catalog");

        let upload_dir = tempfile::tempdir().expect("create upload dir");

        let mut config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        config.payment_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        config.payment_webhook_tolerance_secs = Some(300);
        config.upload_dir = upload_dir.path().display().to_string();

        let gateway = Arc::new(MockGateway::new());
        let state = AppState::new(db.clone(), config, gateway.clone(), None);

        Self {
            router: app_router(state),
            db,
            gateway,
            _upload_dir: upload_dir,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn patch_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method("PATCH")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Delivers a signed webhook event the way the gateway would.
    pub async fn post_webhook(&self, body: &Value) -> (StatusCode, Value) {
        let payload = body.to_string();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_payload(WEBHOOK_SECRET, timestamp, &payload);
        self.request(
            Request::builder()
                .method("POST")
                .uri("/api/webhooks/stripe")
                .header("content-type", "application/json")
                .header("Stripe-Signature", format!("t={},v1={}", timestamp, signature))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
    }

    pub async fn product_id_by_slug(&self, slug: &str) -> Uuid {
        use atelier_api::entities::{product, Product};
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .expect("query product")
            .unwrap_or_else(|| panic!("product {slug} not seeded"))
            .id
    }

    pub async fn inlay_id_by_name(&self, name: &str) -> Uuid {
        use atelier_api::entities::{inlay_option, InlayOption};
        InlayOption::find()
            .filter(inlay_option::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .expect("query inlay")
            .unwrap_or_else(|| panic!("inlay {name} not seeded"))
            .id
    }
}

pub fn sign_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A plausible shipping address body for checkout requests.
pub fn shipping_address() -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "street": "12 Analytical Way",
        "city": "London",
        "country": "GB",
        "postalCode": "N1 9GU"
    })
}
