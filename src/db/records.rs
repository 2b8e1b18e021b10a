//! Row-level operations on the four tables.
//!
//! Identifiers are plain integers. Nothing prevents two rows from sharing
//! one, so updates and deletes by id touch every matching row.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryResult,
    QuerySelect, Set, Statement, Value,
};
use serde::{Deserialize, Serialize};

use super::entities::{claim, food_listing, provider, receiver};
use super::rows::{self, query_result_set, CellKind, ResultSet};
use super::schema::{TableDef, CLAIMS, FOOD_LISTINGS, PROVIDERS, RECEIVERS, TABLES};
use crate::error::{Result, ServerError};

const RECENT_LISTINGS: u64 = 10;

/// Provider fields; also the JSON body of create/update requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderInput {
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<i32>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub provider_type: Option<String>,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiverInput {
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: Option<i32>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub receiver_type: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Contact")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodListingInput {
    #[serde(rename = "Food_ID")]
    pub food_id: Option<i32>,
    #[serde(rename = "Food_Name")]
    pub food_name: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<i32>,
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<i32>,
    #[serde(rename = "Provider_Type")]
    pub provider_type: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Food_Type")]
    pub food_type: Option<String>,
    #[serde(rename = "Meal_Type")]
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimInput {
    #[serde(rename = "Claim_ID")]
    pub claim_id: Option<i32>,
    #[serde(rename = "Food_ID")]
    pub food_id: Option<i32>,
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: Option<i32>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Timestamp", default, with = "crate::db::timestamp")]
    pub timestamp: Option<NaiveDateTime>,
}

/// A food listing as read back. The table has no key, so `Food_ID` may be NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    #[serde(rename = "Food_ID")]
    pub food_id: Option<i32>,
    #[serde(rename = "Food_Name")]
    pub food_name: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<i32>,
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "Provider_ID")]
    pub provider_id: Option<i32>,
    #[serde(rename = "Provider_Type")]
    pub provider_type: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Food_Type")]
    pub food_type: Option<String>,
    #[serde(rename = "Meal_Type")]
    pub meal_type: Option<String>,
}

impl FromQueryResult for ListingRow {
    fn from_query_result(res: &QueryResult, pre: &str) -> std::result::Result<Self, DbErr> {
        Ok(Self {
            food_id: res.try_get(pre, "Food_ID")?,
            food_name: res.try_get(pre, "Food_Name")?,
            quantity: res.try_get(pre, "Quantity")?,
            expiry_date: res.try_get(pre, "Expiry_Date")?,
            provider_id: res.try_get(pre, "Provider_ID")?,
            provider_type: res.try_get(pre, "Provider_Type")?,
            location: res.try_get(pre, "Location")?,
            food_type: res.try_get(pre, "Food_Type")?,
            meal_type: res.try_get(pre, "Meal_Type")?,
        })
    }
}

/// Accepted values per listing attribute; an empty list does not filter
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub locations: Vec<String>,
    pub food_types: Vec<String>,
    pub provider_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub providers: i64,
    pub receivers: i64,
    pub food_listings: i64,
    pub claims: i64,
    pub locations: Vec<String>,
    pub food_types: Vec<String>,
    pub recent_listings: Vec<ListingRow>,
}

fn check_width(table: &TableDef, column: &str, value: &Option<String>) -> Result<()> {
    let (Some(value), Some(max)) = (value, table.effective_type(column).and_then(|t| t.width()))
    else {
        return Ok(());
    };
    if value.chars().count() > max as usize {
        return Err(ServerError::ValueTooLong {
            column: format!("{}.{}", table.name, column),
            max,
        });
    }
    Ok(())
}

fn check_widths(table: &TableDef, values: &[(&str, &Option<String>)]) -> Result<()> {
    for (column, value) in values {
        check_width(table, column, value)?;
    }
    Ok(())
}

/// `MAX(id) + 1`, or 1 for an empty table
pub async fn next_id<C: ConnectionTrait>(db: &C, table: &TableDef) -> Result<i32> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        format!(
            "SELECT COALESCE(MAX({}), 0) + 1 AS next_id FROM {}",
            table.id_column, table.name
        ),
    );
    let next = match db.query_one(stmt).await? {
        Some(row) => row.try_get::<i64>("", "next_id")?,
        None => 1,
    };
    i32::try_from(next).map_err(|_| {
        ServerError::InvalidRequest(format!("{} has no identifiers left", table.name))
    })
}

async fn resolve_id<C: ConnectionTrait>(db: &C, table: &TableDef, id: Option<i32>) -> Result<i32> {
    match id {
        Some(id) => Ok(id),
        None => next_id(db, table).await,
    }
}

/// The path id wins; a different id in the body is a mistake, not a rename
fn check_same_id(table: &TableDef, path_id: i32, body_id: Option<i32>) -> Result<()> {
    match body_id {
        Some(body_id) if body_id != path_id => Err(ServerError::InvalidRequest(format!(
            "{} in body ({}) does not match {}",
            table.id_column, body_id, path_id
        ))),
        _ => Ok(()),
    }
}

fn not_found(table: &TableDef, id: i32) -> ServerError {
    ServerError::RowNotFound {
        table: table.name.to_string(),
        column: table.id_column.to_string(),
        id,
    }
}

pub async fn create_provider<C: ConnectionTrait>(db: &C, input: ProviderInput) -> Result<provider::Model> {
    check_widths(
        &PROVIDERS,
        &[
            ("Name", &input.name),
            ("Type", &input.provider_type),
            ("Address", &input.address),
            ("City", &input.city),
            ("Contact", &input.contact),
        ],
    )?;
    let id = resolve_id(db, &PROVIDERS, input.provider_id).await?;

    let row = provider::ActiveModel {
        provider_id: Set(id),
        name: Set(input.name.clone()),
        provider_type: Set(input.provider_type.clone()),
        address: Set(input.address.clone()),
        city: Set(input.city.clone()),
        contact: Set(input.contact.clone()),
    };
    provider::Entity::insert(row).exec_without_returning(db).await?;
    tracing::debug!("Inserted provider {}", id);

    Ok(provider::Model {
        provider_id: id,
        name: input.name,
        provider_type: input.provider_type,
        address: input.address,
        city: input.city,
        contact: input.contact,
    })
}

pub async fn update_provider<C: ConnectionTrait>(db: &C, id: i32, input: ProviderInput) -> Result<u64> {
    check_same_id(&PROVIDERS, id, input.provider_id)?;
    check_widths(
        &PROVIDERS,
        &[
            ("Name", &input.name),
            ("Type", &input.provider_type),
            ("Address", &input.address),
            ("City", &input.city),
            ("Contact", &input.contact),
        ],
    )?;

    let changes = provider::ActiveModel {
        name: Set(input.name),
        provider_type: Set(input.provider_type),
        address: Set(input.address),
        city: Set(input.city),
        contact: Set(input.contact),
        ..Default::default()
    };
    let result = provider::Entity::update_many()
        .set(changes)
        .filter(provider::Column::ProviderId.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_found(&PROVIDERS, id));
    }
    Ok(result.rows_affected)
}

pub async fn create_receiver<C: ConnectionTrait>(db: &C, input: ReceiverInput) -> Result<receiver::Model> {
    check_widths(
        &RECEIVERS,
        &[
            ("Name", &input.name),
            ("Type", &input.receiver_type),
            ("City", &input.city),
            ("Contact", &input.contact),
        ],
    )?;
    let id = resolve_id(db, &RECEIVERS, input.receiver_id).await?;

    let row = receiver::ActiveModel {
        receiver_id: Set(id),
        name: Set(input.name.clone()),
        receiver_type: Set(input.receiver_type.clone()),
        city: Set(input.city.clone()),
        contact: Set(input.contact.clone()),
    };
    receiver::Entity::insert(row).exec_without_returning(db).await?;
    tracing::debug!("Inserted receiver {}", id);

    Ok(receiver::Model {
        receiver_id: id,
        name: input.name,
        receiver_type: input.receiver_type,
        city: input.city,
        contact: input.contact,
    })
}

pub async fn update_receiver<C: ConnectionTrait>(db: &C, id: i32, input: ReceiverInput) -> Result<u64> {
    check_same_id(&RECEIVERS, id, input.receiver_id)?;
    check_widths(
        &RECEIVERS,
        &[
            ("Name", &input.name),
            ("Type", &input.receiver_type),
            ("City", &input.city),
            ("Contact", &input.contact),
        ],
    )?;

    let changes = receiver::ActiveModel {
        name: Set(input.name),
        receiver_type: Set(input.receiver_type),
        city: Set(input.city),
        contact: Set(input.contact),
        ..Default::default()
    };
    let result = receiver::Entity::update_many()
        .set(changes)
        .filter(receiver::Column::ReceiverId.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_found(&RECEIVERS, id));
    }
    Ok(result.rows_affected)
}

pub async fn create_food_listing<C: ConnectionTrait>(
    db: &C,
    input: FoodListingInput,
) -> Result<food_listing::Model> {
    check_widths(
        &FOOD_LISTINGS,
        &[
            ("Food_Name", &input.food_name),
            ("Provider_Type", &input.provider_type),
            ("Location", &input.location),
            ("Food_Type", &input.food_type),
            ("Meal_Type", &input.meal_type),
        ],
    )?;
    let id = resolve_id(db, &FOOD_LISTINGS, input.food_id).await?;

    let row = food_listing::ActiveModel {
        food_id: Set(id),
        food_name: Set(input.food_name.clone()),
        quantity: Set(input.quantity),
        expiry_date: Set(input.expiry_date),
        provider_id: Set(input.provider_id),
        provider_type: Set(input.provider_type.clone()),
        location: Set(input.location.clone()),
        food_type: Set(input.food_type.clone()),
        meal_type: Set(input.meal_type.clone()),
    };
    food_listing::Entity::insert(row).exec_without_returning(db).await?;
    tracing::debug!("Inserted food listing {}", id);

    Ok(food_listing::Model {
        food_id: id,
        food_name: input.food_name,
        quantity: input.quantity,
        expiry_date: input.expiry_date,
        provider_id: input.provider_id,
        provider_type: input.provider_type,
        location: input.location,
        food_type: input.food_type,
        meal_type: input.meal_type,
    })
}

pub async fn update_food_listing<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: FoodListingInput,
) -> Result<u64> {
    check_same_id(&FOOD_LISTINGS, id, input.food_id)?;
    check_widths(
        &FOOD_LISTINGS,
        &[
            ("Food_Name", &input.food_name),
            ("Provider_Type", &input.provider_type),
            ("Location", &input.location),
            ("Food_Type", &input.food_type),
            ("Meal_Type", &input.meal_type),
        ],
    )?;

    let changes = food_listing::ActiveModel {
        food_name: Set(input.food_name),
        quantity: Set(input.quantity),
        expiry_date: Set(input.expiry_date),
        provider_id: Set(input.provider_id),
        provider_type: Set(input.provider_type),
        location: Set(input.location),
        food_type: Set(input.food_type),
        meal_type: Set(input.meal_type),
        ..Default::default()
    };
    let result = food_listing::Entity::update_many()
        .set(changes)
        .filter(food_listing::Column::FoodId.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_found(&FOOD_LISTINGS, id));
    }
    Ok(result.rows_affected)
}

pub async fn create_claim<C: ConnectionTrait>(db: &C, input: ClaimInput) -> Result<claim::Model> {
    check_widths(&CLAIMS, &[("Status", &input.status)])?;
    let id = resolve_id(db, &CLAIMS, input.claim_id).await?;

    let row = claim::ActiveModel {
        claim_id: Set(id),
        food_id: Set(input.food_id),
        receiver_id: Set(input.receiver_id),
        status: Set(input.status.clone()),
        timestamp: Set(input.timestamp),
    };
    claim::Entity::insert(row).exec_without_returning(db).await?;
    tracing::debug!("Inserted claim {}", id);

    Ok(claim::Model {
        claim_id: id,
        food_id: input.food_id,
        receiver_id: input.receiver_id,
        status: input.status,
        timestamp: input.timestamp,
    })
}

pub async fn update_claim<C: ConnectionTrait>(db: &C, id: i32, input: ClaimInput) -> Result<u64> {
    check_same_id(&CLAIMS, id, input.claim_id)?;
    check_widths(&CLAIMS, &[("Status", &input.status)])?;

    let changes = claim::ActiveModel {
        food_id: Set(input.food_id),
        receiver_id: Set(input.receiver_id),
        status: Set(input.status),
        timestamp: Set(input.timestamp),
        ..Default::default()
    };
    let result = claim::Entity::update_many()
        .set(changes)
        .filter(claim::Column::ClaimId.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_found(&CLAIMS, id));
    }
    Ok(result.rows_affected)
}

/// `DELETE FROM <table> WHERE <id column> = ?`
pub async fn delete_by_id<C: ConnectionTrait>(db: &C, table: &TableDef, id: i32) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE {} = ?", table.name, table.id_column);
    let result = db
        .execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            &sql,
            [Value::from(id)],
        ))
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(table, id));
    }
    tracing::info!("Deleted {} rows from {} with {} = {}", result.rows_affected(), table.name, table.id_column, id);
    Ok(result.rows_affected())
}

pub async fn filter_listings<C: ConnectionTrait>(
    db: &C,
    filter: &ListingFilter,
) -> Result<Vec<ListingRow>> {
    let mut query = food_listing::Entity::find();
    if !filter.locations.is_empty() {
        query = query.filter(food_listing::Column::Location.is_in(filter.locations.clone()));
    }
    if !filter.food_types.is_empty() {
        query = query.filter(food_listing::Column::FoodType.is_in(filter.food_types.clone()));
    }
    if !filter.provider_types.is_empty() {
        query = query.filter(food_listing::Column::ProviderType.is_in(filter.provider_types.clone()));
    }
    Ok(query.into_model::<ListingRow>().all(db).await?)
}

async fn distinct_values<C: ConnectionTrait>(db: &C, table: &TableDef, column: &str) -> Result<Vec<String>> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        format!(
            "SELECT DISTINCT {col} AS value FROM {table} WHERE {col} IS NOT NULL ORDER BY {col}",
            col = column,
            table = table.name
        ),
    );
    let mut values = Vec::new();
    for row in db.query_all(stmt).await? {
        values.push(row.try_get::<String>("", "value")?);
    }
    Ok(values)
}

/// Row counts, filter choices and the first listings
pub async fn dashboard<C: ConnectionTrait>(db: &C) -> Result<Dashboard> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        counts.push(rows::count_rows(db, table).await?);
    }

    Ok(Dashboard {
        providers: counts[0],
        receivers: counts[1],
        food_listings: counts[2],
        claims: counts[3],
        locations: distinct_values(db, &FOOD_LISTINGS, "Location").await?,
        food_types: distinct_values(db, &FOOD_LISTINGS, "Food_Type").await?,
        recent_listings: food_listing::Entity::find()
            .limit(RECENT_LISTINGS)
            .into_model::<ListingRow>()
            .all(db)
            .await?,
    })
}

/// Every claim with its listing's name, location and food type and the
/// receiver's name. Claims pointing at no listing or receiver keep NULLs there.
pub async fn claims_with_details<C: ConnectionTrait>(db: &C) -> Result<ResultSet> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        r#"SELECT c.Claim_ID, c.Food_ID, c.Receiver_ID, c.Status, c.Timestamp,
       f.Food_Name, f.Location, f.Food_Type, r.Name AS Receiver_Name
FROM Claims c
LEFT JOIN Food_Listings_Dataset f ON c.Food_ID = f.Food_ID
LEFT JOIN Receivers r ON c.Receiver_ID = r.Receiver_ID
ORDER BY c.Claim_ID"#
            .to_string(),
    );
    query_result_set(
        db,
        stmt,
        &[
            ("Claim_ID", CellKind::Int),
            ("Food_ID", CellKind::Int),
            ("Receiver_ID", CellKind::Int),
            ("Status", CellKind::Text),
            ("Timestamp", CellKind::DateTime),
            ("Food_Name", CellKind::Text),
            ("Location", CellKind::Text),
            ("Food_Type", CellKind::Text),
            ("Receiver_Name", CellKind::Text),
        ],
    )
    .await
}
