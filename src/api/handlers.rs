use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::{ConnectionTrait, DatabaseConnection};

use super::types::*;
use crate::config::AppConfig;
use crate::db::entities::{claim, food_listing, provider, receiver};
use crate::db::records::{
    self, ClaimInput, Dashboard, FoodListingInput, ListingFilter, ListingRow, ProviderInput,
    ReceiverInput,
};
use crate::db::rows::{self, ResultSet};
use crate::db::{catalog, reports, schema};
use crate::error::{Result, ServerError};

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }
}

fn backend_name(db: &DatabaseConnection) -> &'static str {
    match db.get_database_backend() {
        sea_orm::DbBackend::MySql => "mysql",
        sea_orm::DbBackend::Postgres => "postgres",
        sea_orm::DbBackend::Sqlite => "sqlite",
    }
}

// ============================================================================
// Service
// ============================================================================

/// Health check
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<Dashboard>> {
    Ok(Json(records::dashboard(&state.db).await?))
}

// ============================================================================
// Schema
// ============================================================================

/// GET /api/schema - tables as the database currently describes them
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Result<Json<SchemaResponse>> {
    let mut tables = Vec::with_capacity(schema::TABLES.len());
    for table in schema::TABLES {
        tables.push(TableSchema {
            name: table.name.to_string(),
            id_column: table.id_column.to_string(),
            columns: catalog::describe_table(&state.db, table.name).await?,
        });
    }

    Ok(Json(SchemaResponse {
        backend: backend_name(&state.db).to_string(),
        database: catalog::current_database(&state.db).await?,
        tables,
    }))
}

/// GET /api/schema/script - the bootstrap as a SQL script
pub async fn get_schema_script(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let statements =
        schema::bootstrap_script(state.db.get_database_backend(), &state.config.db_name)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        schema::render_script(&statements),
    ))
}

// ============================================================================
// Tables
// ============================================================================

/// GET /api/tables/:table - `SELECT *`
pub async fn get_table(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
) -> Result<Json<ResultSet>> {
    let table = schema::lookup(&table)?;
    Ok(Json(rows::select_all(&state.db, table).await?))
}

/// GET /api/tables/:table/:id - every row carrying that id
pub async fn get_rows(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, i32)>,
) -> Result<Json<ResultSet>> {
    let table = schema::lookup(&table)?;
    let result = rows::select_by_id(&state.db, table, id).await?;
    if result.is_empty() {
        return Err(ServerError::RowNotFound {
            table: table.name.to_string(),
            column: table.id_column.to_string(),
            id,
        });
    }
    Ok(Json(result))
}

/// DELETE /api/tables/:table/:id
pub async fn delete_rows(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, i32)>,
) -> Result<Json<DeletedResponse>> {
    let table = schema::lookup(&table)?;
    let deleted = records::delete_by_id(&state.db, table, id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

// ============================================================================
// Records
// ============================================================================

/// GET /api/listings?location=..&food_type=..&provider_type=..
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<ListingRow>>> {
    let filter = ListingFilter::from(&query);
    Ok(Json(records::filter_listings(&state.db, &filter).await?))
}

pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProviderInput>,
) -> Result<(StatusCode, Json<provider::Model>)> {
    let created = records::create_provider(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<ProviderInput>,
) -> Result<Json<UpdatedResponse>> {
    let updated = records::update_provider(&state.db, id, input).await?;
    Ok(Json(UpdatedResponse { updated }))
}

pub async fn create_receiver(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReceiverInput>,
) -> Result<(StatusCode, Json<receiver::Model>)> {
    let created = records::create_receiver(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_receiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<ReceiverInput>,
) -> Result<Json<UpdatedResponse>> {
    let updated = records::update_receiver(&state.db, id, input).await?;
    Ok(Json(UpdatedResponse { updated }))
}

pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(input): Json<FoodListingInput>,
) -> Result<(StatusCode, Json<food_listing::Model>)> {
    let created = records::create_food_listing(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<FoodListingInput>,
) -> Result<Json<UpdatedResponse>> {
    let updated = records::update_food_listing(&state.db, id, input).await?;
    Ok(Json(UpdatedResponse { updated }))
}

/// GET /api/claims - claims joined with listing and receiver names
pub async fn list_claims(State(state): State<Arc<AppState>>) -> Result<Json<ResultSet>> {
    Ok(Json(records::claims_with_details(&state.db).await?))
}

pub async fn create_claim(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ClaimInput>,
) -> Result<(StatusCode, Json<claim::Model>)> {
    let created = records::create_claim(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_claim(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<ClaimInput>,
) -> Result<Json<UpdatedResponse>> {
    let updated = records::update_claim(&state.db, id, input).await?;
    Ok(Json(UpdatedResponse { updated }))
}

// ============================================================================
// Reports
// ============================================================================

/// GET /api/reports - the catalog
pub async fn list_reports() -> Json<Vec<ReportSummary>> {
    Json(reports::REPORTS.iter().map(ReportSummary::from).collect())
}

/// GET /api/reports/:slug
pub async fn run_report(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ResultSet>> {
    let report = reports::find(&slug)?;
    Ok(Json(reports::run(&state.db, report, &params).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_state() -> (TempDir, Arc<AppState>) {
        let (temp_dir, db) = testing::fresh_db().await;
        let config = AppConfig::sqlite(temp_dir.path().to_path_buf());
        (temp_dir, Arc::new(AppState::new(db, config)))
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "OK");
    }

    #[tokio::test]
    async fn test_table_lookup_is_case_insensitive() {
        let (_temp_dir, state) = test_state().await;
        testing::seed(&state.db).await;

        let Json(result) = get_table(State(state.clone()), Path("claims".to_string()))
            .await
            .unwrap();
        assert_eq!(result.len(), 5);

        let err = get_table(State(state), Path("Donors".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_then_fetch_and_delete() {
        let (_temp_dir, state) = test_state().await;

        let body: ProviderInput = serde_json::from_value(json!({
            "Name": "Gonzales Diner",
            "Type": "Restaurant",
            "City": "Adambury",
            "Contact": "+1-600-220-0480x3322"
        }))
        .unwrap();
        let (status, Json(created)) = create_provider(State(state.clone()), Json(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.provider_id, 1);

        let Json(rows) = get_rows(State(state.clone()), Path(("Providers".to_string(), 1)))
            .await
            .unwrap();
        assert_eq!(rows.column("Contact").unwrap(), vec![&json!("+1-600-220-0480x3322")]);

        let Json(deleted) = delete_rows(State(state.clone()), Path(("providers".to_string(), 1)))
            .await
            .unwrap();
        assert_eq!(deleted.deleted, 1);

        let err = get_rows(State(state), Path(("Providers".to_string(), 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::RowNotFound { id: 1, .. }));
    }

    #[tokio::test]
    async fn test_claim_body_dates() {
        let (_temp_dir, state) = test_state().await;

        let body: ClaimInput = serde_json::from_value(json!({
            "Food_ID": 4,
            "Receiver_ID": 2,
            "Status": "Pending",
            "Timestamp": "2025-03-05T14:30:00"
        }))
        .unwrap();
        let (_, Json(created)) = create_claim(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(created.claim_id, 1);
        assert_eq!(
            serde_json::to_value(&created).unwrap()["Timestamp"],
            json!("2025-03-05 14:30:00")
        );

        let Json(claims) = get_table(State(state.clone()), Path("Claims".to_string()))
            .await
            .unwrap();
        assert_eq!(claims.column("Timestamp").unwrap(), vec![&json!("2025-03-05 14:30:00")]);

        // The form the table read returns is accepted back
        let body: ClaimInput = serde_json::from_value(json!({
            "Claim_ID": 1,
            "Status": "Completed",
            "Timestamp": claims.column("Timestamp").unwrap()[0]
        }))
        .unwrap();
        let Json(updated) = update_claim(State(state), Path(1), Json(body)).await.unwrap();
        assert_eq!(updated.updated, 1);
    }

    #[tokio::test]
    async fn test_list_claims_with_details() {
        let (_temp_dir, state) = test_state().await;
        testing::seed(&state.db).await;
        records::create_claim(&state.db, testing::claim(6, 99, 1, "Pending"))
            .await
            .unwrap();

        let Json(claims) = list_claims(State(state)).await.unwrap();
        assert_eq!(claims.len(), 6);
        assert_eq!(claims.column("Food_Name").unwrap()[2], &json!("Soup"));
        assert_eq!(claims.column("Receiver_Name").unwrap()[2], &json!("City Food Bank"));
        assert_eq!(claims.column("Food_Name").unwrap()[5], &json!(null));
        assert_eq!(claims.column("Receiver_Name").unwrap()[5], &json!("Hope Shelter"));
    }

    #[tokio::test]
    async fn test_update_and_validation_errors() {
        let (_temp_dir, state) = test_state().await;
        testing::seed(&state.db).await;

        let Json(updated) = update_receiver(
            State(state.clone()),
            Path(2),
            Json(testing::receiver(2, "Food Bank North", "Food Bank", "Lake Mary")),
        )
        .await
        .unwrap();
        assert_eq!(updated.updated, 1);

        let mut too_long = testing::listing(9, "Bread", 1, 1, "Restaurant", "Adambury", "Vegan", "Lunch");
        too_long.food_name = Some("x".repeat(101));
        let err = create_listing(State(state.clone()), Json(too_long)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = update_provider(State(state), Path(77), Json(ProviderInput::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_listings_with_filters() {
        let (_temp_dir, state) = test_state().await;
        testing::seed(&state.db).await;

        let query = ListingQuery {
            location: Some("Lake Mary".into()),
            food_type: Some("Vegetarian,Vegan".into()),
            provider_type: None,
        };
        let Json(listings) = list_listings(State(state.clone()), Query(query)).await.unwrap();
        let mut ids: Vec<i32> = listings.iter().filter_map(|l| l.food_id).collect();
        ids.sort();
        assert_eq!(ids, vec![3, 5]);

        // A listing stored without an identifier is still served
        state
            .db
            .execute_unprepared(
                "INSERT INTO Food_Listings_Dataset (Food_ID, Food_Name, Location) VALUES (NULL, 'Orphan', 'Lake Mary')",
            )
            .await
            .unwrap();
        let query = ListingQuery {
            location: Some("Lake Mary".into()),
            food_type: None,
            provider_type: None,
        };
        let Json(listings) = list_listings(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(listings.len(), 3);
        assert!(listings.iter().any(|l| l.food_id.is_none()));

        let Json(dashboard) = dashboard(State(state)).await.unwrap();
        assert_eq!(dashboard.food_listings, 6);
    }

    #[tokio::test]
    async fn test_reports_endpoints() {
        let (_temp_dir, state) = test_state().await;
        testing::seed(&state.db).await;

        let Json(catalog) = list_reports().await;
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog[2].param.map(|p| p.name), Some("city"));

        let params = HashMap::from([("city".to_string(), "Springfield".to_string())]);
        let Json(result) = run_report(
            State(state.clone()),
            Path("provider-contacts".to_string()),
            Query(params),
        )
        .await
        .unwrap();
        assert_eq!(result.column("Name").unwrap(), vec![&json!("Cater Co")]);

        let err = run_report(State(state), Path("nope".to_string()), Query(HashMap::new()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_schema_endpoints() {
        let (_temp_dir, state) = test_state().await;

        let Json(described) = get_schema(State(state.clone())).await.unwrap();
        assert_eq!(described.backend, "sqlite");
        assert_eq!(described.database.as_deref(), Some("Foodwastedb"));
        assert_eq!(described.tables.len(), 4);
        assert_eq!(described.tables[2].name, "Food_Listings_Dataset");

        let Json(dashboard) = dashboard(State(state)).await.unwrap();
        assert_eq!(dashboard.providers, 0);
        assert!(dashboard.recent_listings.is_empty());
    }
}
