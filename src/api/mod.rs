pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

pub use handlers::AppState;

/// Create the JSON API router.
/// Table paths take any of the four table names, matched case-insensitively.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/dashboard", get(handlers::dashboard))
        // Schema
        .route("/api/schema", get(handlers::get_schema))
        .route("/api/schema/script", get(handlers::get_schema_script))
        // Raw table access
        .route("/api/tables/:table", get(handlers::get_table))
        .route(
            "/api/tables/:table/:id",
            get(handlers::get_rows).delete(handlers::delete_rows),
        )
        // Records
        .route("/api/providers", post(handlers::create_provider))
        .route("/api/providers/:id", put(handlers::update_provider))
        .route("/api/receivers", post(handlers::create_receiver))
        .route("/api/receivers/:id", put(handlers::update_receiver))
        .route(
            "/api/listings",
            get(handlers::list_listings).post(handlers::create_listing),
        )
        .route("/api/listings/:id", put(handlers::update_listing))
        .route(
            "/api/claims",
            get(handlers::list_claims).post(handlers::create_claim),
        )
        .route("/api/claims/:id", put(handlers::update_claim))
        // Reports
        .route("/api/reports", get(handlers::list_reports))
        .route("/api/reports/:slug", get(handlers::run_report))
}
