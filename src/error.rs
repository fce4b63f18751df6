use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Field name → validation messages, in field order.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Application-wide error types with appropriate HTTP status codes.
///
/// Rejections produced by the middleware pipeline (401, 429) are not part of
/// this enum; they carry their own fixed bodies.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(ValidationErrors),

    #[error("Category still has {products_count} product(s)")]
    CategoryInUse { products_count: usize },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    products_count: Option<usize>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Error de validación"),
            AppError::CategoryInUse { .. } => (
                StatusCode::CONFLICT,
                "No se puede eliminar: la categoría tiene productos asociados",
            ),
            // Internal errors - log the details, never expose them to clients
            AppError::Internal(_) | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor")
            }
        };

        if status.is_client_error() {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            success: false,
            message,
            errors: match &self {
                AppError::Validation(errors) => Some(errors),
                _ => None,
            },
            products_count: match &self {
                AppError::CategoryInUse { products_count } => Some(*products_count),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = render(AppError::NotFound("Producto no encontrado".into())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Producto no encontrado");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let (status, body) =
            render(AppError::invalid_field("name", "El campo name es obligatorio.")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Error de validación");
        assert_eq!(body["errors"]["name"][0], "El campo name es obligatorio.");
    }

    #[tokio::test]
    async fn test_category_in_use_reports_count() {
        let (status, body) = render(AppError::CategoryInUse { products_count: 3 }).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["products_count"], 3);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = render(AppError::Internal("lock poisoned at row 12".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error interno del servidor");
        assert!(!body.to_string().contains("row 12"));
    }
}
