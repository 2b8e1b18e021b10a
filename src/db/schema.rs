//! Foodwastedb table definitions and DDL rendering.
//!
//! The four tables carry column types only: no primary keys, no NOT NULL,
//! no foreign keys. `Provider_ID`, `Receiver_ID`, `Food_ID` and `Claim_ID`
//! are identifiers by convention; nothing in the DDL enforces uniqueness or
//! references between tables.

use std::fmt;

use sea_orm::DbBackend;
use serde::Serialize;

use crate::error::{Result, ServerError};

/// Declared SQL type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    VarChar(u32),
    Date,
    DateTime,
}

impl ColumnType {
    /// Parse a declared type as reported by the engine (`VARCHAR(50)`, `int(11)`, `datetime`)
    pub fn parse(declared: &str) -> Option<Self> {
        let declared = declared.trim().to_ascii_lowercase();
        let (base, arg) = match declared.find('(') {
            Some(open) => {
                let close = declared.rfind(')')?;
                (declared[..open].trim(), Some(declared[open + 1..close].trim()))
            }
            None => (declared.as_str(), None),
        };

        match base {
            "int" | "integer" => Some(ColumnType::Int),
            "varchar" => arg?.parse().ok().map(ColumnType::VarChar),
            "date" => Some(ColumnType::Date),
            "datetime" => Some(ColumnType::DateTime),
            _ => None,
        }
    }

    pub fn width(&self) -> Option<u32> {
        match self {
            ColumnType::VarChar(width) => Some(*width),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "INT"),
            ColumnType::VarChar(width) => write!(f, "VARCHAR({})", width),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::DateTime => write!(f, "DATETIME"),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A column as declared at table creation
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// A column as the engine currently reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [ColumnDef],
}

/// A schema change applied after the tables exist
#[derive(Debug, Clone, Copy)]
pub struct ColumnWidening {
    pub table: &'static str,
    pub column: &'static str,
    pub width: u32,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef { name, ty }
}

pub const PROVIDERS: TableDef = TableDef {
    name: "Providers",
    id_column: "Provider_ID",
    columns: &[
        col("Provider_ID", ColumnType::Int),
        col("Name", ColumnType::VarChar(100)),
        col("Type", ColumnType::VarChar(50)),
        col("Address", ColumnType::VarChar(255)),
        col("City", ColumnType::VarChar(100)),
        col("Contact", ColumnType::VarChar(20)),
    ],
};

pub const RECEIVERS: TableDef = TableDef {
    name: "Receivers",
    id_column: "Receiver_ID",
    columns: &[
        col("Receiver_ID", ColumnType::Int),
        col("Name", ColumnType::VarChar(100)),
        col("Type", ColumnType::VarChar(50)),
        col("City", ColumnType::VarChar(100)),
        col("Contact", ColumnType::VarChar(20)),
    ],
};

pub const FOOD_LISTINGS: TableDef = TableDef {
    name: "Food_Listings_Dataset",
    id_column: "Food_ID",
    columns: &[
        col("Food_ID", ColumnType::Int),
        col("Food_Name", ColumnType::VarChar(100)),
        col("Quantity", ColumnType::Int),
        col("Expiry_Date", ColumnType::Date),
        col("Provider_ID", ColumnType::Int),
        col("Provider_Type", ColumnType::VarChar(50)),
        col("Location", ColumnType::VarChar(100)),
        col("Food_Type", ColumnType::VarChar(50)),
        col("Meal_Type", ColumnType::VarChar(50)),
    ],
};

pub const CLAIMS: TableDef = TableDef {
    name: "Claims",
    id_column: "Claim_ID",
    columns: &[
        col("Claim_ID", ColumnType::Int),
        col("Food_ID", ColumnType::Int),
        col("Receiver_ID", ColumnType::Int),
        col("Status", ColumnType::VarChar(50)),
        col("Timestamp", ColumnType::DateTime),
    ],
};

/// Creation order; none of the tables references another
pub const TABLES: [&TableDef; 4] = [&PROVIDERS, &RECEIVERS, &FOOD_LISTINGS, &CLAIMS];

pub const CONTACT_WIDENING: ColumnWidening = ColumnWidening {
    table: "Providers",
    column: "Contact",
    width: 50,
};

pub const WIDENINGS: &[ColumnWidening] = &[CONTACT_WIDENING];

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Column type once every widening has been applied
    pub fn effective_type(&self, column: &str) -> Option<ColumnType> {
        let def = self.column(column)?;
        let widened = WIDENINGS
            .iter()
            .filter(|w| w.table == self.name && w.column == def.name)
            .last();
        Some(match widened {
            Some(w) => ColumnType::VarChar(w.width),
            None => def.ty,
        })
    }

    pub fn declared_columns(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.to_string(),
                ty: c.ty,
            })
            .collect()
    }

    pub fn create_sql(&self) -> String {
        create_table_sql(self.name, &self.declared_columns(), true)
    }

    pub fn select_all_sql(&self) -> String {
        format!("SELECT * FROM {}", self.name)
    }
}

/// Find one of the four tables, ignoring case like the engines do
pub fn lookup(name: &str) -> Result<&'static TableDef> {
    TABLES
        .iter()
        .copied()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ServerError::UnknownTable(name.to_string()))
}

pub fn create_table_sql(table: &str, columns: &[ColumnInfo], if_not_exists: bool) -> String {
    let columns: Vec<String> = columns
        .iter()
        .map(|c| format!("    {} {}", c.name, c.ty))
        .collect();
    format!(
        "CREATE TABLE {}{} (\n{}\n)",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table,
        columns.join(",\n")
    )
}

pub fn create_database_sql(backend: DbBackend, db_name: &str) -> Result<Option<String>> {
    match backend {
        DbBackend::MySql => Ok(Some(format!("CREATE DATABASE IF NOT EXISTS {}", db_name))),
        // The SQLite database is the file itself
        DbBackend::Sqlite => Ok(None),
        DbBackend::Postgres => Err(ServerError::UnsupportedBackend("postgres".into())),
    }
}

pub fn use_database_sql(backend: DbBackend, db_name: &str) -> Result<Option<String>> {
    match backend {
        DbBackend::MySql => Ok(Some(format!("USE {}", db_name))),
        DbBackend::Sqlite => Ok(None),
        DbBackend::Postgres => Err(ServerError::UnsupportedBackend("postgres".into())),
    }
}

/// Statements that change `column` of `table` to `VARCHAR(width)`.
///
/// `current` is the table's column list as the engine reports it. SQLite has
/// no ALTER COLUMN, so the table is rebuilt: rename, recreate, copy, drop.
/// The statements must run in one transaction.
pub fn set_width_sql(
    backend: DbBackend,
    table: &str,
    current: &[ColumnInfo],
    column: &str,
    width: u32,
) -> Result<Vec<String>> {
    if !current.iter().any(|c| c.name == column) {
        return Err(ServerError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
    }

    match backend {
        DbBackend::MySql => Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {} {}",
            table,
            column,
            ColumnType::VarChar(width)
        )]),
        DbBackend::Sqlite => {
            let staging = format!("{}__rebuild", table);
            let rebuilt: Vec<ColumnInfo> = current
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name.clone(),
                    ty: if c.name == column {
                        ColumnType::VarChar(width)
                    } else {
                        c.ty
                    },
                })
                .collect();
            let names: Vec<&str> = current.iter().map(|c| c.name.as_str()).collect();
            let names = names.join(", ");

            Ok(vec![
                format!("ALTER TABLE {} RENAME TO {}", table, staging),
                create_table_sql(table, &rebuilt, false),
                format!("INSERT INTO {} ({}) SELECT {} FROM {}", table, names, names, staging),
                format!("DROP TABLE {}", staging),
            ])
        }
        DbBackend::Postgres => Err(ServerError::UnsupportedBackend("postgres".into())),
    }
}

/// The full bootstrap as SQL text: create and select the database, create
/// the four tables, select everything from each, widen Providers.Contact.
pub fn bootstrap_script(backend: DbBackend, db_name: &str) -> Result<Vec<String>> {
    let mut statements = Vec::new();

    if let Some(sql) = create_database_sql(backend, db_name)? {
        statements.push(sql);
    }
    if let Some(sql) = use_database_sql(backend, db_name)? {
        statements.push(sql);
    }
    for table in TABLES {
        statements.push(table.create_sql());
    }
    for table in TABLES {
        statements.push(table.select_all_sql());
    }
    for widening in WIDENINGS {
        let table = lookup(widening.table)?;
        statements.extend(set_width_sql(
            backend,
            table.name,
            &table.declared_columns(),
            widening.column,
            widening.width,
        )?);
    }

    Ok(statements)
}

pub fn render_script(statements: &[String]) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(statement);
        script.push_str(";\n\n");
    }
    script
}
