use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_catalog::config::{CatalogConfig, LogFormat};
use storefront_catalog::CatalogService;
use storefront_db::store::PgProductStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = CatalogConfig::from_env().context("Invalid configuration")?;

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_catalog=info,storefront_seed=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        max_connections = config.max_connections,
        run_migrations = config.run_migrations,
        "Loaded catalog configuration"
    );

    // --- Database ---
    let pool = storefront_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    storefront_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    if config.run_migrations {
        storefront_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    // --- Seed ---
    let catalog = CatalogService::new(PgProductStore::new(pool.clone()));
    let outcome = catalog.run_seed().await.context("Seeding failed")?;
    println!("{outcome}");

    pool.close().await;
    Ok(())
}
