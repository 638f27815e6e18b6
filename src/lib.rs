use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use services::payments::PaymentGateway;

/// Uploads can carry 10 MiB of image plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Option<events::EventSender>,
    pub services: handlers::AppServices,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Option<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::build(
            db.clone(),
            &config,
            gateway.clone(),
            event_sender.clone(),
        );
        Self {
            db,
            config,
            event_sender,
            services,
            gateway,
        }
    }
}

/// Builds the full application router with middleware applied.
pub fn app_router(state: AppState) -> Router {
    let cors = build_cors(&state.config);
    let upload_dir = state.config.upload_dir.clone();

    // The upload route gets a raised body limit; everything else keeps the
    // framework default.
    let upload_routes = Router::new()
        .route("/api/upload", post(handlers::uploads::upload_asset))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/", get(root))
        .route("/api/status", get(status))
        .route("/api/health", get(health))
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products/:slug", get(handlers::products::get_product))
        .route("/api/checkout", post(handlers::checkout::checkout))
        .route(
            "/api/orders/:id",
            get(handlers::orders::get_order).patch(handlers::orders::update_order),
        )
        .route("/api/webhooks/:gateway", post(handlers::webhooks::gateway_webhook))
        .merge(upload_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors)
        .with_state(state)
}

fn build_cors(config: &config::AppConfig) -> CorsLayer {
    match config
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

async fn root() -> impl IntoResponse {
    concat!("Atelier Storefront API v", env!("CARGO_PKG_VERSION"), ", see /docs")
}

async fn status() -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        ),
    }
}
