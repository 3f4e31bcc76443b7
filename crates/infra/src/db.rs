//! Database connection pool bootstrap.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::AppConfig;

/// Connect a bounded Postgres pool. Acquisitions queue once every connection is busy.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    tracing::info!(max_connections, "initializing postgres connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!("postgres connection pool ready");
    Ok(pool)
}

/// Connect using `config`, or `None` when no `DATABASE_URL` is configured.
pub async fn connect_from_config(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    match &config.database_url {
        Some(url) => connect(url, config.db_max_connections).await.map(Some),
        None => Ok(None),
    }
}
