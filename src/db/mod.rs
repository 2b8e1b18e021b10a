//! Database module: Foodwastedb bootstrap over SeaORM (SQLite or MySQL)

pub mod catalog;
pub mod entities;
pub mod records;
pub mod reports;
pub mod rows;
pub mod schema;
pub mod timestamp;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};

use crate::config::{AppConfig, DatabaseTarget};
use crate::error::Result;
use schema::{TABLES, WIDENINGS};

/// Create and select the database, then bring the schema up to date
pub async fn init_database(config: &AppConfig) -> Result<DatabaseConnection> {
    let db = connect(config).await?;

    create_tables(&db).await?;
    probe_tables(&db).await?;
    apply_widenings(&db).await?;

    Ok(db)
}

/// Connect to the configured database, creating it first when needed.
///
/// Connecting to the named database is the equivalent of `USE`.
async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    match &config.target {
        DatabaseTarget::Sqlite { dir } => {
            std::fs::create_dir_all(dir)?;
            let db_path = dir.join(format!("{}.db", config.db_name));
            let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
            tracing::info!("Connecting to database: {}", db_url);

            Ok(Database::connect(&db_url).await?)
        }
        DatabaseTarget::MySql { server_url } => {
            tracing::info!("Connecting to MySQL server to create {}", config.db_name);
            let server = Database::connect(server_url.as_str()).await?;
            if let Some(sql) = schema::create_database_sql(DbBackend::MySql, &config.db_name)? {
                server
                    .execute(Statement::from_string(DbBackend::MySql, sql))
                    .await?;
            }
            drop(server);

            let db_url = format!("{}/{}", server_url, config.db_name);
            tracing::info!("Selecting database {}", config.db_name);
            Ok(Database::connect(&db_url).await?)
        }
    }
}

/// Create all four tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    for table in TABLES {
        if catalog::table_exists(db, table.name).await? {
            tracing::debug!("Table {} already exists", table.name);
            continue;
        }
        db.execute(Statement::from_string(
            db.get_database_backend(),
            table.create_sql(),
        ))
        .await?;
        tracing::debug!("Created table {}", table.name);
    }

    tracing::info!("Database tables initialized");
    Ok(())
}

/// Run `SELECT *` against every table and report what it holds
async fn probe_tables(db: &DatabaseConnection) -> Result<()> {
    for table in TABLES {
        let result = rows::select_all(db, table).await?;
        tracing::info!(
            "{}: {} rows, columns [{}]",
            table.name,
            result.len(),
            result.columns.join(", ")
        );
    }
    Ok(())
}

async fn apply_widenings(db: &DatabaseConnection) -> Result<()> {
    for widening in WIDENINGS {
        let table = schema::lookup(widening.table)?;
        catalog::set_column_width(db, table, widening.column, widening.width).await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, NaiveDateTime};
    use sea_orm::DatabaseConnection;
    use tempfile::TempDir;

    use super::records::{self, ClaimInput, FoodListingInput, ProviderInput, ReceiverInput};
    use crate::config::AppConfig;

    /// Bootstrapped database in a throwaway directory
    pub async fn fresh_db() -> (TempDir, DatabaseConnection) {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::sqlite(temp_dir.path().to_path_buf());
        let db = super::init_database(&config).await.unwrap();
        (temp_dir, db)
    }

    pub fn provider(id: i32, name: &str, kind: &str, city: &str) -> ProviderInput {
        ProviderInput {
            provider_id: Some(id),
            name: Some(name.to_string()),
            provider_type: Some(kind.to_string()),
            address: Some(format!("{} Main St", id)),
            city: Some(city.to_string()),
            contact: Some(format!("555-010{}", id)),
        }
    }

    pub fn receiver(id: i32, name: &str, kind: &str, city: &str) -> ReceiverInput {
        ReceiverInput {
            receiver_id: Some(id),
            name: Some(name.to_string()),
            receiver_type: Some(kind.to_string()),
            city: Some(city.to_string()),
            contact: Some(format!("555-020{}", id)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn listing(
        id: i32,
        name: &str,
        quantity: i32,
        provider_id: i32,
        provider_type: &str,
        location: &str,
        food_type: &str,
        meal_type: &str,
    ) -> FoodListingInput {
        FoodListingInput {
            food_id: Some(id),
            food_name: Some(name.to_string()),
            quantity: Some(quantity),
            expiry_date: NaiveDate::from_ymd_opt(2025, 3, 20),
            provider_id: Some(provider_id),
            provider_type: Some(provider_type.to_string()),
            location: Some(location.to_string()),
            food_type: Some(food_type.to_string()),
            meal_type: Some(meal_type.to_string()),
        }
    }

    pub fn claim(id: i32, food_id: i32, receiver_id: i32, status: &str) -> ClaimInput {
        ClaimInput {
            claim_id: Some(id),
            food_id: Some(food_id),
            receiver_id: Some(receiver_id),
            status: Some(status.to_string()),
            timestamp: NaiveDateTime::parse_from_str("2025-03-05 10:00:00", "%Y-%m-%d %H:%M:%S").ok(),
        }
    }

    /// Small dataset shared by the record, report and handler tests
    pub async fn seed(db: &DatabaseConnection) {
        for input in [
            provider(1, "Gonzales Diner", "Restaurant", "Adambury"),
            provider(2, "Fresh Mart", "Supermarket", "Adambury"),
            provider(3, "Baker Bros", "Grocery Store", "Lake Mary"),
            provider(4, "Cater Co", "Catering Service", "Springfield"),
        ] {
            records::create_provider(db, input).await.unwrap();
        }

        for input in [
            receiver(1, "Hope Shelter", "Shelter", "Adambury"),
            receiver(2, "City Food Bank", "Food Bank", "Lake Mary"),
            receiver(3, "Kind Hearts", "Charity", "Riverton"),
        ] {
            records::create_receiver(db, input).await.unwrap();
        }

        for input in [
            listing(1, "Bread", 10, 1, "Restaurant", "Adambury", "Vegetarian", "Breakfast"),
            listing(2, "Rice", 30, 2, "Supermarket", "Adambury", "Vegan", "Lunch"),
            listing(3, "Soup", 20, 3, "Grocery Store", "Lake Mary", "Vegetarian", "Dinner"),
            listing(4, "Chicken", 15, 2, "Supermarket", "Adambury", "Non-Vegetarian", "Dinner"),
            listing(5, "Bread", 5, 3, "Grocery Store", "Lake Mary", "Vegetarian", "Breakfast"),
        ] {
            records::create_food_listing(db, input).await.unwrap();
        }

        for input in [
            claim(1, 1, 1, "Completed"),
            claim(2, 2, 1, "Completed"),
            claim(3, 3, 2, "Pending"),
            claim(4, 4, 2, "Completed"),
            claim(5, 2, 3, "Cancelled"),
        ] {
            records::create_claim(db, input).await.unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{ColumnInfo, ColumnType, PROVIDERS};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bootstrap_creates_and_selects_database() {
        let (temp_dir, db) = testing::fresh_db().await;

        assert!(temp_dir.path().join("Foodwastedb.db").exists());
        assert_eq!(
            catalog::current_database(&db).await.unwrap().as_deref(),
            Some("Foodwastedb")
        );
    }

    #[tokio::test]
    async fn test_bootstrap_creates_declared_tables() {
        let (_temp_dir, db) = testing::fresh_db().await;

        for table in TABLES {
            let described = catalog::describe_table(&db, table.name).await.unwrap();
            let expected: Vec<ColumnInfo> = table
                .columns
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name.to_string(),
                    ty: table.effective_type(c.name).unwrap(),
                })
                .collect();
            assert_eq!(described, expected, "columns of {}", table.name);
        }
    }

    #[tokio::test]
    async fn test_contact_is_widened() {
        let (_temp_dir, db) = testing::fresh_db().await;

        let providers = catalog::describe_table(&db, "Providers").await.unwrap();
        let contact = providers.iter().find(|c| c.name == "Contact").unwrap();
        assert_eq!(contact.ty, ColumnType::VarChar(50));

        // Receivers.Contact keeps its declared width
        let receivers = catalog::describe_table(&db, "Receivers").await.unwrap();
        let contact = receivers.iter().find(|c| c.name == "Contact").unwrap();
        assert_eq!(contact.ty, ColumnType::VarChar(20));
    }

    #[tokio::test]
    async fn test_bootstrap_is_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::sqlite(temp_dir.path().to_path_buf());

        let db = init_database(&config).await.unwrap();
        records::create_provider(&db, testing::provider(7, "Corner Cafe", "Restaurant", "Adambury"))
            .await
            .unwrap();
        drop(db);

        let db = init_database(&config).await.unwrap();
        let providers = rows::select_all(&db, &PROVIDERS).await.unwrap();
        assert_eq!(providers.len(), 1);

        let described = catalog::describe_table(&db, "Providers").await.unwrap();
        assert_eq!(described.last().unwrap().ty, ColumnType::VarChar(50));
    }

    #[tokio::test]
    async fn test_contact_width_is_fifty_regardless_of_prior_width() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::sqlite(temp_dir.path().to_path_buf());

        // Pre-create Providers with a wider Contact than the bootstrap wants
        {
            let db = connect(&config).await.unwrap();
            let mut columns = PROVIDERS.declared_columns();
            columns.last_mut().unwrap().ty = ColumnType::VarChar(80);
            db.execute(Statement::from_string(
                DbBackend::Sqlite,
                schema::create_table_sql("Providers", &columns, false),
            ))
            .await
            .unwrap();
        }

        let db = init_database(&config).await.unwrap();
        let described = catalog::describe_table(&db, "Providers").await.unwrap();
        assert_eq!(described.last().unwrap().ty, ColumnType::VarChar(50));
    }
}
