use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("No rows in {table} with {column} = {id}")]
    RowNotFound {
        table: String,
        column: String,
        id: i32,
    },

    #[error("Value for {column} is longer than {max} characters")]
    ValueTooLong { column: String, max: u32 },

    #[error("Cannot set {table}.{column} to width {width}: {rows} existing values are longer")]
    WidthViolation {
        table: String,
        column: String,
        width: u32,
        rows: i64,
    },

    #[error("Unsupported database backend: {0}")]
    UnsupportedBackend(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownTable(_)
            | ServerError::UnknownReport(_)
            | ServerError::RowNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::UnknownColumn { .. }
            | ServerError::ValueTooLong { .. }
            | ServerError::WidthViolation { .. }
            | ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedBackend(_)
            | ServerError::Config(_)
            | ServerError::Database(_)
            | ServerError::Template(_)
            | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
