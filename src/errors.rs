use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use serde::Serialize;
use validator::ValidationErrors;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";
pub const DUPLICATE_SUBMISSION_MESSAGE: &str =
    "You have already submitted a message recently. Please wait before sending another.";
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many contact form submissions from this IP, please try again later.";

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    BadRequest(String),
    DuplicateSubmission,
    RateLimited,
    NotFound(String),
    UnauthorizedAccess,
    ForbiddenAccess(String),
    /// A read failed; the string is the message shown to the client.
    OperationFailed(String),
    /// Cause is logged, never shown to the client.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::DuplicateSubmission => write!(f, "{}", DUPLICATE_SUBMISSION_MESSAGE),
            AppError::RateLimited => write!(f, "{}", RATE_LIMITED_MESSAGE),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::ForbiddenAccess(msg) => write!(f, "Forbidden: {}", msg),
            AppError::OperationFailed(msg) => write!(f, "{}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl AppError {
    /// Message placed in the `message` field of the error envelope.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "Validation failed".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::UnauthorizedAccess => "Missing or invalid admin credentials".to_string(),
            AppError::ForbiddenAccess(msg) => msg.clone(),
            AppError::InternalError(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalError(cause) = self {
            tracing::error!("Internal error: {}", cause);
        }

        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "success": false,
                    "message": self.public_message(),
                    "errors": errors
                })
            }
            _ => {
                serde_json::json!({
                    "success": false,
                    "message": self.public_message()
                })
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateSubmission => StatusCode::TOO_MANY_REQUESTS,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenAccess(_) => StatusCode::FORBIDDEN,
            AppError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        // field_errors() is backed by a HashMap
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Contact submission not found".into()),
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
