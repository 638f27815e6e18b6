use atelier_api::services::payments::{PaymentGateway, StripeGateway};
use atelier_api::{app_router, config, db, events, AppState};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    info!(
        environment = %app_config.environment,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = Arc::new(db::establish_connection_from_app_config(&app_config).await?);
    if app_config.auto_migrate {
        db::ensure_schema(&db_pool).await?;
    }

    let (event_tx, event_rx) = mpsc::channel(app_config.event_channel_capacity);
    let event_sender = events::EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx));

    let stripe_secret = app_config.stripe_secret_key.clone().unwrap_or_else(|| {
        warn!("stripe_secret_key is not configured; payment intent creation will fail");
        String::new()
    });
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(stripe_secret));

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let state = AppState::new(db_pool, app_config, gateway, Some(event_sender));
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, draining connections");
}
