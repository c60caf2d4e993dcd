use std::sync::Arc;

use anyhow::Context;

mod config;
mod db;
mod error;
mod export;
mod handlers;
mod models;
mod routes;
mod store;
mod validation;

use config::Config;
use store::{MemoryMoodStore, MoodStore, PgMoodStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MoodStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn MoodStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, &config)
                .await
                .context("Failed to create database pool")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database migrations applied");
            Arc::new(PgMoodStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, mood entries are kept in memory only");
            Arc::new(MemoryMoodStore::new())
        }
    };

    let state = AppState {
        store,
        config: config.clone(),
    };

    let app = routes::build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
