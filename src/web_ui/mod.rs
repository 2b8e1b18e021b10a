//! Web UI Module
//!
//! Server-rendered pages over the same database the JSON API uses:
//! the dashboard at `/`, a browser for each table and the report gallery.

mod routes;
mod templates;

use axum::Router;
use std::sync::Arc;

use crate::api::AppState;

/// Create the web UI router.
/// Mount this with `.merge(web_ui::router())` in main.rs
pub fn router() -> Router<Arc<AppState>> {
    routes::create_router()
}
