//! What the engine itself reports about the schema, and column width changes.

use std::path::Path;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement, TransactionTrait, Value,
};
use serde::Serialize;

use super::schema::{self, ColumnInfo, ColumnType, TableDef};
use crate::error::{Result, ServerError};

/// Outcome of a width change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WidthChange {
    Unchanged { width: u32 },
    Changed { from: u32, to: u32 },
}

/// Name of the selected database
pub async fn current_database<C: ConnectionTrait>(db: &C) -> Result<Option<String>> {
    let backend = db.get_database_backend();
    match backend {
        DbBackend::Sqlite => {
            let rows = db
                .query_all(Statement::from_string(
                    backend,
                    "SELECT name, file FROM pragma_database_list".to_string(),
                ))
                .await?;
            for row in rows {
                let name: String = row.try_get("", "name")?;
                if name == "main" {
                    let file: String = row.try_get("", "file")?;
                    return Ok(Path::new(&file)
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned()));
                }
            }
            Ok(None)
        }
        DbBackend::MySql => {
            let row = db
                .query_one(Statement::from_string(
                    backend,
                    "SELECT DATABASE() AS name".to_string(),
                ))
                .await?;
            match row {
                Some(row) => Ok(row.try_get::<Option<String>>("", "name")?),
                None => Ok(None),
            }
        }
        DbBackend::Postgres => Err(ServerError::UnsupportedBackend("postgres".into())),
    }
}

/// Columns of `table` in ordinal order; empty when the table does not exist
pub async fn describe_table<C: ConnectionTrait>(db: &C, table: &str) -> Result<Vec<ColumnInfo>> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => {
            "SELECT name AS column_name, type AS column_type FROM pragma_table_info(?) ORDER BY cid"
        }
        DbBackend::MySql => {
            r#"
            SELECT COLUMN_NAME AS column_name, COLUMN_TYPE AS column_type
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#
        }
        DbBackend::Postgres => return Err(ServerError::UnsupportedBackend("postgres".into())),
    };

    let rows = db
        .query_all(Statement::from_sql_and_values(
            backend,
            sql,
            [Value::from(table.to_string())],
        ))
        .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("", "column_name")?;
        let declared: String = row.try_get("", "column_type")?;
        let ty = ColumnType::parse(&declared).ok_or_else(|| {
            DbErr::Custom(format!("unrecognised type {} for {}.{}", declared, table, name))
        })?;
        columns.push(ColumnInfo { name, ty });
    }

    Ok(columns)
}

pub async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool> {
    Ok(!describe_table(db, table).await?.is_empty())
}

/// Set a text column of one of the four tables to `VARCHAR(width)`.
///
/// Setting the current width is a no-op. Shrinking fails when any stored
/// value is longer than `width`; the table is left untouched in that case.
pub async fn set_column_width(
    db: &DatabaseConnection,
    table: &TableDef,
    column: &str,
    width: u32,
) -> Result<WidthChange> {
    let unknown_column = || ServerError::UnknownColumn {
        table: table.name.to_string(),
        column: column.to_string(),
    };

    let def = table.column(column).ok_or_else(unknown_column)?;
    let current = describe_table(db, table.name).await?;
    let current_type = current
        .iter()
        .find(|c| c.name == def.name)
        .map(|c| c.ty)
        .ok_or_else(unknown_column)?;

    let current_width = current_type.width().ok_or_else(|| {
        ServerError::InvalidRequest(format!(
            "{}.{} is {}, not a text column",
            table.name, def.name, current_type
        ))
    })?;

    if width == 0 {
        return Err(ServerError::InvalidRequest("column width must be positive".into()));
    }

    if current_width == width {
        tracing::debug!("{}.{} already VARCHAR({})", table.name, def.name, width);
        return Ok(WidthChange::Unchanged { width });
    }

    let backend = db.get_database_backend();
    if width < current_width {
        let too_long = count_longer_than(db, backend, table.name, def.name, width).await?;
        if too_long > 0 {
            return Err(ServerError::WidthViolation {
                table: table.name.to_string(),
                column: def.name.to_string(),
                width,
                rows: too_long,
            });
        }
    }

    let statements = schema::set_width_sql(backend, table.name, &current, def.name, width)?;
    let txn = db.begin().await?;
    for sql in statements {
        tracing::debug!("{}", sql);
        txn.execute(Statement::from_string(backend, sql)).await?;
    }
    txn.commit().await?;

    tracing::info!(
        "{}.{} changed from VARCHAR({}) to VARCHAR({})",
        table.name,
        def.name,
        current_width,
        width
    );
    Ok(WidthChange::Changed {
        from: current_width,
        to: width,
    })
}

async fn count_longer_than<C: ConnectionTrait>(
    db: &C,
    backend: DbBackend,
    table: &str,
    column: &str,
    width: u32,
) -> Result<i64> {
    let length_fn = match backend {
        DbBackend::MySql => "CHAR_LENGTH",
        _ => "LENGTH",
    };
    let sql = format!(
        "SELECT COUNT(*) AS too_long FROM {} WHERE {}({}) > ?",
        table, length_fn, column
    );

    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            &sql,
            [Value::from(width as i64)],
        ))
        .await?;

    match row {
        Some(row) => Ok(row.try_get::<i64>("", "too_long")?),
        None => Ok(0),
    }
}
