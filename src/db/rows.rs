//! Tabular query results decoded by declared column type.

use sea_orm::{ConnectionTrait, QueryResult, Statement, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::schema::{ColumnType, TableDef};
use super::timestamp;
use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How to read one output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Int,
    Float,
    Text,
    Date,
    DateTime,
}

impl From<ColumnType> for CellKind {
    fn from(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Int => CellKind::Int,
            ColumnType::VarChar(_) => CellKind::Text,
            ColumnType::Date => CellKind::Date,
            ColumnType::DateTime => CellKind::DateTime,
        }
    }
}

/// Column names plus rows of JSON cells, in select order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&JsonValue>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

pub(crate) fn decode_cell(row: &QueryResult, column: &str, kind: CellKind) -> Result<JsonValue> {
    let value = match kind {
        CellKind::Int => JsonValue::from(row.try_get::<Option<i64>>("", column)?),
        CellKind::Float => JsonValue::from(row.try_get::<Option<f64>>("", column)?),
        CellKind::Text => JsonValue::from(row.try_get::<Option<String>>("", column)?),
        CellKind::Date => JsonValue::from(
            row.try_get::<Option<chrono::NaiveDate>>("", column)?
                .map(|d| d.format(DATE_FORMAT).to_string()),
        ),
        CellKind::DateTime => JsonValue::from(
            row.try_get::<Option<chrono::NaiveDateTime>>("", column)?
                .map(|d| d.format(timestamp::FORMAT).to_string()),
        ),
    };
    Ok(value)
}

/// Run `stmt` and decode every row by the given output columns
pub(crate) async fn query_result_set<C: ConnectionTrait>(
    db: &C,
    stmt: Statement,
    columns: &[(&str, CellKind)],
) -> Result<ResultSet> {
    let results = db.query_all(stmt).await?;

    let mut rows = Vec::with_capacity(results.len());
    for result in &results {
        let mut row = Vec::with_capacity(columns.len());
        for (name, kind) in columns {
            row.push(decode_cell(result, name, *kind)?);
        }
        rows.push(row);
    }

    Ok(ResultSet {
        columns: columns.iter().map(|(name, _)| name.to_string()).collect(),
        rows,
    })
}

fn table_columns(table: &TableDef) -> Vec<(&'static str, CellKind)> {
    table
        .columns
        .iter()
        .map(|c| (c.name, CellKind::from(c.ty)))
        .collect()
}

/// `SELECT * FROM <table>`: every row, every column, declared order
pub async fn select_all<C: ConnectionTrait>(db: &C, table: &TableDef) -> Result<ResultSet> {
    let stmt = Statement::from_string(db.get_database_backend(), table.select_all_sql());
    query_result_set(db, stmt, &table_columns(table)).await
}

/// Every row whose identifier column equals `id`; there may be several
pub async fn select_by_id<C: ConnectionTrait>(db: &C, table: &TableDef, id: i32) -> Result<ResultSet> {
    let sql = format!("{} WHERE {} = ?", table.select_all_sql(), table.id_column);
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), &sql, [Value::from(id)]);
    query_result_set(db, stmt, &table_columns(table)).await
}

pub async fn count_rows<C: ConnectionTrait>(db: &C, table: &TableDef) -> Result<i64> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        format!("SELECT COUNT(*) AS row_count FROM {}", table.name),
    );
    match db.query_one(stmt).await? {
        Some(row) => Ok(row.try_get::<i64>("", "row_count")?),
        None => Ok(0),
    }
}
