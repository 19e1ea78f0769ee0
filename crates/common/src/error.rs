//! Error types for polls-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Path of the sign-in endpoint that unauthenticated callers are sent to.
pub const LOGIN_PATH: &str = "/api/signin";

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(i32),

    #[error("Choice not found: {0}")]
    ChoiceNotFound(i32),

    /// A vote submission omitted its choice or named one outside the question.
    #[error("{0}")]
    InvalidSelection(String),

    /// The question is outside its publish/close window.
    #[error("{0}")]
    NotVotable(String),

    /// No identity present for an action that requires one.
    #[error("Login required")]
    LoginRequired {
        /// The originally requested path, replayed after sign-in.
        next: String,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::QuestionNotFound(_) | Self::ChoiceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::LoginRequired { .. } | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotVotable(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidSelection(_) | Self::BadRequest(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::QuestionNotFound(_) => "QUESTION_NOT_FOUND",
            Self::ChoiceNotFound(_) => "CHOICE_NOT_FOUND",
            Self::InvalidSelection(_) => "INVALID_SELECTION",
            Self::NotVotable(_) => "NOT_VOTABLE",
            Self::LoginRequired { .. } => "LOGIN_REQUIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Sign-in URL that returns the caller to `next` afterwards.
    #[must_use]
    pub fn login_url(next: &str) -> String {
        format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = match &self {
            Self::LoginRequired { next } => json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                    "loginUrl": Self::login_url(next),
                }
            }),
            _ => json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::QuestionNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidSelection("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotVotable("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::LoginRequired { next: "/".to_string() }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(AppError::Database("boom".to_string()).is_server_error());
        assert!(!AppError::Unauthorized.is_server_error());
    }

    #[test]
    fn test_login_url_keeps_original_path() {
        assert_eq!(
            AppError::login_url("/api/polls/1/vote"),
            "/api/signin?next=%2Fapi%2Fpolls%2F1%2Fvote"
        );
    }

    #[test]
    fn test_invalid_selection_message_is_verbatim() {
        let err = AppError::InvalidSelection("You didn't select a choice.".to_string());
        assert_eq!(err.to_string(), "You didn't select a choice.");
        assert_eq!(err.error_code(), "INVALID_SELECTION");
    }
}
