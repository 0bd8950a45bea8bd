// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

// Every failure the core can surface. Handlers return it directly and
// `IntoResponse` turns it into `{ "kind": ..., "error": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Weekly hours cap exceeded: {current} + {requested} > {max}")]
    CapacityExceeded {
        current: Decimal,
        requested: Decimal,
        max: Decimal,
    },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or missing authentication token")]
    InvalidToken,

    #[error("This action requires the admin role")]
    Forbidden,

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Machine-readable kind sent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => "VALIDATION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Duplicate(_) => "DUPLICATE",
            AppError::InvalidCredentials | AppError::InvalidToken => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            _ => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::CapacityExceeded { .. }
            | AppError::InvalidState(_)
            | AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Unique-violation mapping shared by the Postgres repositories.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Duplicate(format!("{} already exists", what));
            }
        }
        AppError::DatabaseError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let body = match self {
            // Return every field error so the form can highlight them.
            AppError::ValidationError(ref errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "kind": kind,
                    "error": "One or more fields are invalid.",
                    "details": details,
                })
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Internal server error: {:?}", e);
                json!({ "kind": kind, "error": "An unexpected error occurred." })
            }
            e => json!({ "kind": kind, "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
