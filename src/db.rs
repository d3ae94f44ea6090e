use crate::config::AppConfig;
use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

// Setup the database and execute any migrations
pub async fn setup_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to migrate the database")?;
        tracing::info!("Migrations executed");
    }

    Ok(pool)
}
