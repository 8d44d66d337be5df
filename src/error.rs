//! Central error type. Handlers return `AppError` and never build error JSON
//! themselves; `IntoResponse` picks the status code and envelope.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// One failing input field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Columns guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    fn label(&self) -> &'static str {
        match self {
            UniqueField::Username => "Username",
            UniqueField::Email => "Email",
        }
    }

    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_username_key" => Some(UniqueField::Username),
            "users_email_key" => Some(UniqueField::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Validation error")]
    StoreValidation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{} already exists.", .0.label())]
    Duplicate(UniqueField),

    #[error("Invalid reference.")]
    InvalidReference,

    #[error("Invalid token.")]
    TokenMalformed,

    #[error("Token expired.")]
    TokenExpired,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::StoreValidation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidReference => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::TokenMalformed | AppError::TokenExpired | AppError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(e) => tracing::error!(error = ?e, "unhandled error"),
            AppError::TokenMalformed
            | AppError::TokenExpired
            | AppError::Unauthenticated(_)
            | AppError::Forbidden(_) => tracing::warn!(error = %self, "request rejected"),
            _ => tracing::debug!(error = %self, "request failed"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = match &self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            AppError::StoreValidation(details) => {
                json!({ "error": self.to_string(), "details": details })
            }
            other => json!({ "error": other.to_string() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or_default();
            match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    if let Some(field) = UniqueField::from_constraint(constraint) {
                        return AppError::Duplicate(field);
                    }
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => return AppError::InvalidReference,
                sqlx::error::ErrorKind::CheckViolation => {
                    return AppError::StoreValidation(vec![FieldError::new(
                        checked_column(constraint),
                        db.message(),
                    )]);
                }
                _ => {}
            }
        }
        AppError::Internal(anyhow::Error::new(e).context("database error"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// `users_role_check` -> `role`
fn checked_column(constraint: &str) -> &str {
    let column = constraint.strip_suffix("_check").unwrap_or(constraint);
    column
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(column)
}

/// JSON body extractor whose rejections go through [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

pub async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found")
}
