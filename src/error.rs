//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` used throughout the application.
//! The variants are error *kinds*, not transport codes: the workflows return them and
//! the `ResponseError` implementation decides how each kind is presented over HTTP.
//!
//! Every kind renders a stable, caller-safe message. Details carried by
//! `InternalError` are written to the log and never echoed back to the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::store::StoreError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Login email/password combination did not verify.
    /// Deliberately covers both "no such user" and "wrong password".
    InvalidCredentials,
    /// Uniqueness violation on register or user update.
    EmailAlreadyRegistered,
    /// The user record is absent or soft-deleted.
    UserNotFound,
    /// The task does not exist or belongs to someone else. The two causes are
    /// indistinguishable on purpose.
    TaskNotFoundOrUnauthorized,
    /// Missing, invalid or expired bearer credential.
    Unauthorized,
    /// A new task carried a due date in the past under the `reject` policy.
    InvalidDueDate,
    /// Storage or cryptographic failure unrelated to caller input.
    InternalError(String),
    /// The request could not be interpreted at all (HTTP 400).
    BadRequest(String),
    /// Input failed field validation (HTTP 422).
    ValidationError(String),
    /// The capability is named in the interface but intentionally not provided.
    NotImplemented,
}

impl AppError {
    /// Shorthand used when wrapping lower level failures.
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::InternalError(msg.into())
    }

    /// The message sent to clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Invalid credentials".into(),
            AppError::EmailAlreadyRegistered => "Email already registered".into(),
            AppError::UserNotFound => "User not found".into(),
            AppError::TaskNotFoundOrUnauthorized => "Task not found or unauthorized".into(),
            AppError::Unauthorized => "Unauthorized".into(),
            AppError::InvalidDueDate => "Invalid due date".into(),
            AppError::InternalError(_) => "Internal server error".into(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::NotImplemented => "Not implemented".into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::EmailAlreadyRegistered => write!(f, "Email already registered"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::TaskNotFoundOrUnauthorized => write!(f, "Task not found or unauthorized"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::InvalidDueDate => write!(f, "Invalid due date"),
            AppError::InternalError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::NotImplemented => write!(f, "Not implemented"),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::EmailAlreadyRegistered => StatusCode::CONFLICT,
            AppError::UserNotFound | AppError::TaskNotFoundOrUnauthorized => StatusCode::NOT_FOUND,
            AppError::InvalidDueDate | AppError::ValidationError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalError(detail) = self {
            log::error!("Internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.public_message()
        }))
    }
}

/// Storage failures are terminal for the request. Unique violations that reach this
/// conversion were not anticipated by a workflow and are reported as internal.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::InternalError(error.to_string())
    }
}

/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Every token failure collapses into `Unauthorized`; the cause is not leaked.
impl From<TokenError> for AppError {
    fn from(_: TokenError) -> AppError {
        AppError::Unauthorized
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalError(format!("bcrypt: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let response = AppError::Unauthorized.error_response();
        assert_eq!(response.status(), 401);

        let response = AppError::InvalidCredentials.error_response();
        assert_eq!(response.status(), 401);

        let response = AppError::BadRequest("Invalid input".into()).error_response();
        assert_eq!(response.status(), 400);

        let response = AppError::TaskNotFoundOrUnauthorized.error_response();
        assert_eq!(response.status(), 404);

        let response = AppError::EmailAlreadyRegistered.error_response();
        assert_eq!(response.status(), 409);

        let response = AppError::InvalidDueDate.error_response();
        assert_eq!(response.status(), 422);

        let response = AppError::NotImplemented.error_response();
        assert_eq!(response.status(), 501);

        let response = AppError::internal("pool timed out").error_response();
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_internal_details_are_not_public() {
        let error = AppError::internal("relation \"users\" does not exist");
        assert_eq!(error.public_message(), "Internal server error");
        assert!(error.to_string().contains("relation"));
    }

    #[test]
    fn test_token_failures_collapse_to_unauthorized() {
        for cause in [TokenError::InvalidToken, TokenError::Malformed, TokenError::Expired] {
            assert_eq!(AppError::from(cause), AppError::Unauthorized);
        }
    }
}
