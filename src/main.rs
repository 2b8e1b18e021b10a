mod api;
mod config;
mod db;
mod error;
mod web_ui;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::{AppConfig, DatabaseTarget};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodwaste=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> error::Result<()> {
    let config = AppConfig::from_env()?;
    match &config.target {
        DatabaseTarget::Sqlite { dir } => {
            tracing::info!("Using SQLite database {} in {:?}", config.db_name, dir)
        }
        DatabaseTarget::MySql { .. } => {
            tracing::info!("Using MySQL database {}", config.db_name)
        }
    }

    // Create, select and bring the schema up to date
    let db = db::init_database(&config).await?;
    tracing::info!("Database {} ready", config.db_name);

    let addr = config.listen_addr;
    let state = Arc::new(AppState::new(db, config));

    let app = Router::new()
        .merge(api::router())
        .merge(web_ui::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Foodwaste server starting on http://{}", addr);
    tracing::info!("  GET /api/tables/:table  - Raw table contents");
    tracing::info!("  GET /api/reports        - Report catalog");
    tracing::info!("Web UI: http://{}/", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
