//! sc-im Service - Supply Chain Inventory Management
//!
//! 批处理入口：按需执行全量库存重算

use std::sync::Arc;

use config::AppConfig;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use telemetry::{TelemetrySettings, init_tracing};
use tracing::info;

use sc_im::application::ServiceHandler;
use sc_im::application::commands::RecalculateStockCommand;
use sc_im::infrastructure::persistence::{
    PostgresDispatchNoteRepository, PostgresInventoryRecordRepository, PostgresMasterDataLookup,
    PostgresOrderRepository, PostgresProductionRecordRepository, PostgresStockEventStore,
    PostgresStockUnitRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_tracing(&TelemetrySettings::new(
        config.telemetry.log_level.clone(),
        config.is_production(),
    ));
    let metrics_handle = telemetry::init_metrics();

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Initializing sc-im Service..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database.url.expose_secret())
        .await?;
    info!("Database pool initialized");

    let inventory_repo = Arc::new(PostgresInventoryRecordRepository::new(pool.clone()));
    let unit_repo = Arc::new(PostgresStockUnitRepository::new(pool.clone()));
    let order_repo = Arc::new(PostgresOrderRepository::new(pool.clone()));
    let production_repo = Arc::new(PostgresProductionRecordRepository::new(pool.clone()));
    let dispatch_repo = Arc::new(PostgresDispatchNoteRepository::new(pool.clone()));
    let master_data = Arc::new(PostgresMasterDataLookup::new(pool.clone()));
    let event_store = Arc::new(PostgresStockEventStore::new(pool));
    info!("Repositories initialized");

    let handler = ServiceHandler::new(
        inventory_repo,
        unit_repo,
        order_repo,
        production_repo,
        dispatch_repo,
        master_data,
        event_store,
        config.reconcile.prune_orphans,
    );

    let report = handler.recalculate(RecalculateStockCommand).await?;
    info!(
        updated = report.updated_records,
        pruned = report.pruned_records,
        units_resynced = report.units_resynced,
        skipped_productions = report.skipped_productions,
        "Recalculation done"
    );
    tracing::debug!(metrics = %metrics_handle.render(), "Job metrics");

    Ok(())
}
