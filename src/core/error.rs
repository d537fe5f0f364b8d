use std::borrow::Cow;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures, rendered as `field: message`
    #[error("Validation error: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Anonymous access to a protected route; answered with a redirect to the login endpoint
    #[error("Login required: {0}")]
    LoginRequired(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    /// Single-field validation failure
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::fields(vec![(field, message.into())])
    }

    /// Validation failure on several fields at once
    pub fn fields(failures: Vec<(&'static str, String)>) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, message) in failures {
            let mut error = ValidationError::new("invalid");
            error.message = Some(Cow::Owned(message));
            errors.add(field, error);
        }
        AppError::InvalidFields(errors)
    }
}

/// Flatten validation errors to sorted `field: message` lines
pub fn field_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();
    messages
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::InvalidFields(ref errs) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(field_messages(errs)),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::LoginRequired(ref location) => {
                let body = Json(ApiResponse::<()>::error(
                    Some("Please log in to access this page.".to_string()),
                    None,
                ));
                return (
                    StatusCode::SEE_OTHER,
                    [(header::LOCATION, location.clone())],
                    body,
                )
                    .into_response();
            }
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::ExternalServiceError(ref msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "Too short"))]
        name: String,
        #[validate(email(message = "Invalid email"))]
        email: String,
    }

    #[test]
    fn test_field_messages_are_sorted_and_prefixed() {
        let sample = Sample {
            name: "ab".to_string(),
            email: "nope".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(
            field_messages(&errors),
            vec!["email: Invalid email".to_string(), "name: Too short".to_string()]
        );
    }

    #[test]
    fn test_single_field_error() {
        let err = AppError::field("email", "Email is already registered.");
        match err {
            AppError::InvalidFields(ref errs) => {
                assert_eq!(
                    field_messages(errs),
                    vec!["email: Email is already registered.".to_string()]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_login_required_redirects() {
        let response = AppError::LoginRequired("/api/auth/user/login?next=%2Fx".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/auth/user/login?next=%2Fx"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Conflict("x".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
