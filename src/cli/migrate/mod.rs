//! Migrate command - applies the Postgres schema

use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{self, PostgresMigrator, StorageConfig};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let postgres = match config.storage_config()? {
        StorageConfig::Postgres { config, .. } => config,
        StorageConfig::InMemory => {
            anyhow::bail!("migrate requires storage.backend = \"postgres\"");
        }
    };

    let pool = storage::connect(&postgres).await?;
    let applied = storage::run_storage_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool).current_version().await?;

    info!(applied, "Migrations complete");
    println!(
        "Applied {} migration(s); schema version {}",
        applied,
        version.map_or_else(|| "none".to_string(), |v| v.to_string())
    );

    Ok(())
}
