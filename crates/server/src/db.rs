use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Create the PostgreSQL connection pool.
///
/// The record tables are owned by the tenant record store, so no migrations
/// run here.
pub async fn init_pg_pool(config: &estate_core::config::PostgresConfig) -> anyhow::Result<PgPool> {
    if !config.is_configured() {
        warn!("DATABASE_URL / PG_USERNAME not set, falling back to local defaults");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url())
        .await?;

    info!("PostgreSQL connected: {} (db={})", config.host, config.database);
    Ok(pool)
}
