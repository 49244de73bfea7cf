use crate::data::{MemoryStore, Repositories};
use crate::infrastructure::config::AppConfig;
use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        "Database connection pool created (max {} connections)",
        max_connections
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to apply migrations")?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// PostgreSQL when a database URL is configured, otherwise a process-local
/// store that is lost on restart.
pub async fn open_repositories(config: &AppConfig) -> Result<Repositories> {
    match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url, config.database_max_connections).await?;
            run_migrations(&pool).await?;
            Ok(Repositories::postgres(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data will live in memory only");
            Ok(Repositories::in_memory(Arc::new(MemoryStore::new())))
        }
    }
}
