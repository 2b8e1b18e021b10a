//! API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::db::records::ListingFilter;
use crate::db::reports::{Report, ReportParam};
use crate::db::rows::CellKind;
use crate::db::schema::ColumnInfo;

// ============================================================================
// Request Types
// ============================================================================

/// GET /api/listings query; each field is a comma separated value list
#[derive(Debug, Deserialize, Default)]
pub struct ListingQuery {
    pub location: Option<String>,
    pub food_type: Option<String>,
    pub provider_type: Option<String>,
}

fn split_values(values: Option<&str>) -> Vec<String> {
    values
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl From<&ListingQuery> for ListingFilter {
    fn from(query: &ListingQuery) -> Self {
        ListingFilter {
            locations: split_values(query.location.as_deref()),
            food_types: split_values(query.food_type.as_deref()),
            provider_types: split_values(query.provider_type.as_deref()),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

/// One table as the database describes it
#[derive(Debug, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub id_column: String,
    pub columns: Vec<ColumnInfo>,
}

/// GET /api/schema response
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub backend: String,
    pub database: Option<String>,
    pub tables: Vec<TableSchema>,
}

/// Report catalog entry; the SQL is included so callers can see what runs
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub slug: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
    pub columns: Vec<ReportColumn>,
    pub param: Option<ReportParam>,
}

#[derive(Debug, Serialize)]
pub struct ReportColumn {
    pub name: &'static str,
    pub kind: CellKind,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        ReportSummary {
            slug: report.slug,
            title: report.title,
            sql: report.sql,
            columns: report
                .columns
                .iter()
                .map(|&(name, kind)| ReportColumn { name, kind })
                .collect(),
            param: report.param,
        }
    }
}
