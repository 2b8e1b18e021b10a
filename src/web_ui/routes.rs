//! Web UI route handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tera::Context;

use super::templates;
use crate::api::AppState;
use crate::db::records::{self, ListingFilter};
use crate::db::reports::{self, ReportParam, REPORTS};
use crate::db::rows::{self, ResultSet};
use crate::db::schema::{self, TABLES};
use crate::error::{Result, ServerError};

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/ui", get(index))
        .route("/ui/tables/:table", get(table_view))
        .route("/ui/claims", get(claims_view))
        .route("/ui/reports", get(reports_view))
}

/// Dashboard query: one location and one food type, empty meaning all
#[derive(Debug, Default, serde::Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    location: String,
    #[serde(default)]
    food_type: String,
}

/// One report as shown on the reports page
#[derive(Debug, Serialize)]
struct ReportEntry {
    title: &'static str,
    sql: &'static str,
    param: Option<ReportParam>,
    param_value: Option<String>,
    result: ResultSet,
}

/// Context with the navigation every page carries
fn page_context() -> Context {
    let mut context = Context::new();
    let tables: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
    context.insert("nav_tables", &tables);
    context
}

/// Helper to render a template
fn render_template(name: &str, context: &Context) -> Result<Response> {
    let html = templates::render(name, context)?;
    Ok(Html(html).into_response())
}

/// Render an error page with the status the error maps to
fn render_error(error: ServerError) -> Response {
    let status = error.status();
    let message = if status.is_server_error() {
        tracing::error!("Page failed: {}", error);
        "Internal server error".to_string()
    } else {
        error.to_string()
    };

    let mut context = page_context();
    context.insert("message", &message);
    match templates::render("error.html", &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message).into_response(),
    }
}

fn into_page(result: Result<Response>) -> Response {
    result.unwrap_or_else(render_error)
}

/// Dashboard: counts, filter choices and listings
async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    into_page(index_page(&state, &query).await)
}

async fn index_page(state: &AppState, query: &DashboardQuery) -> Result<Response> {
    let dashboard = records::dashboard(&state.db).await?;

    let filter = ListingFilter {
        locations: non_empty(&query.location),
        food_types: non_empty(&query.food_type),
        provider_types: Vec::new(),
    };
    let filtered = !filter.locations.is_empty() || !filter.food_types.is_empty();
    let listings = if filtered {
        records::filter_listings(&state.db, &filter).await?
    } else {
        dashboard.recent_listings.clone()
    };

    let mut context = page_context();
    context.insert("dashboard", &dashboard);
    context.insert("listings", &listings);
    context.insert("filtered", &filtered);
    context.insert("selected_location", &query.location);
    context.insert("selected_food_type", &query.food_type);

    render_template("index.html", &context)
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Every row of one table
async fn table_view(State(state): State<Arc<AppState>>, Path(table): Path<String>) -> Response {
    into_page(table_page(&state, &table).await)
}

async fn table_page(state: &AppState, table: &str) -> Result<Response> {
    let table = schema::lookup(table)?;
    let result = rows::select_all(&state.db, table).await?;

    let mut context = page_context();
    context.insert("table_name", table.name);
    context.insert("result", &result);

    render_template("table.html", &context)
}

/// Claims next to the food and receiver they point at
async fn claims_view(State(state): State<Arc<AppState>>) -> Response {
    into_page(claims_page(&state).await)
}

async fn claims_page(state: &AppState) -> Result<Response> {
    let result = records::claims_with_details(&state.db).await?;

    let mut context = page_context();
    context.insert("table_name", "Claim details");
    context.insert("result", &result);

    render_template("table.html", &context)
}

/// All reports with their SQL and current results
async fn reports_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    into_page(reports_page(&state, &params).await)
}

async fn reports_page(state: &AppState, params: &HashMap<String, String>) -> Result<Response> {
    let mut entries = Vec::with_capacity(REPORTS.len());
    for report in REPORTS {
        entries.push(ReportEntry {
            title: report.title,
            sql: report.sql,
            param: report.param,
            param_value: report.param_value(params),
            result: reports::run(&state.db, report, params).await?,
        });
    }

    let mut context = page_context();
    context.insert("reports", &entries);

    render_template("reports.html", &context)
}
