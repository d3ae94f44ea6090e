mod config;
mod db;
mod error;
mod extractors;
mod filter;
mod models;
mod routes;
use crate::config::AppConfig;
use axum::extract::FromRef;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub http: reqwest::Client,
}

impl FromRef<AppState> for sqlx::PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for reqwest::Client {
    fn from_ref(state: &AppState) -> Self {
        state.http.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ramen_blog_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppConfig::load().expect("Failed to load config.toml");

    let pool = db::setup_database(&settings).await?;
    let state = AppState {
        db: pool,
        config: settings.clone(),
        http: reqwest::Client::new(),
    };
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", settings.server_addr);
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
