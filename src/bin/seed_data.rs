//! Loads the demo catalog (products, variants, inlay options) into the
//! configured database. Idempotent: existing rows are left alone.

use atelier_api::services::catalog::seed_demo_catalog;
use atelier_api::{config, db};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    let db_pool = db::establish_connection_from_app_config(&app_config).await?;
    db::ensure_schema(&db_pool).await?;
    seed_demo_catalog(&db_pool).await?;

    info!("Demo catalog seeded");
    Ok(())
}
