//! API error type shared by every route handler.
//!
//! Two kinds of failure reach the client: a validation failure (400 with a
//! per-field message map) and an operation failure (everything else).

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::content::blocks::BlockError;
use crate::invoice::pdf::PdfError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![msg.into()]);
        ApiError::Validation(fields)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store(_) | ApiError::Storage(_) | ApiError::Pdf(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        flatten_validation_errors(&errors, "", &mut fields);
        ApiError::Validation(fields)
    }
}

impl From<BlockError> for ApiError {
    fn from(err: BlockError) -> Self {
        ApiError::invalid_field("contentBlocks", err.to_string())
    }
}

/// `sub_items` -> `subItems`, matching the JSON field names clients send.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten nested validator output into dotted camelCase paths
/// (`items.0.subItems`).
fn flatten_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            camel_case(field)
        } else {
            format!("{}.{}", prefix, camel_case(field))
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = out.entry(path).or_default();
                for err in errs {
                    messages.push(
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("invalid ({})", err.code)),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(inner, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(fields) => ErrorResponse {
                error: "Validation failed".to_string(),
                message: Some("Please fix the highlighted fields and try again.".to_string()),
                fields: Some(fields),
            },
            ApiError::Store(ref e) => {
                tracing::error!(error = %e, "document store error");
                ErrorResponse {
                    error: "Database error".to_string(),
                    message: None,
                    fields: None,
                }
            }
            ApiError::Storage(ref e) => {
                if status.is_server_error() {
                    tracing::error!(error = %e, "object storage error");
                }
                ErrorResponse {
                    error: e.user_message(),
                    message: None,
                    fields: None,
                }
            }
            ApiError::Pdf(ref e) => {
                tracing::error!(error = %e, "pdf rendering error");
                ErrorResponse {
                    error: "Failed to generate PDF".to_string(),
                    message: None,
                    fields: None,
                }
            }
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                ErrorResponse {
                    error: msg.clone(),
                    message: None,
                    fields: None,
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                message: None,
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
