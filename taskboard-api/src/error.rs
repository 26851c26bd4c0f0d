/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every failure is an [`ApiError`] that
/// renders as the standard envelope with `success: false` and the matching
/// status code. Library errors convert via `From`, so `?` is all a handler
/// needs.
///
/// Internal errors are logged and answered with a generic message. The
/// underlying detail rides along as an [`ErrorDetail`] response extension;
/// outside production the error-detail layer copies it into `data`.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::error::{ApiError, ApiResult};
/// use taskboard_api::response::ApiResponse;
/// use taskboard_shared::models::user::User;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn handler(pool: PgPool, id: Uuid) -> ApiResult<ApiResponse<User>> {
///     let user = User::find_by_id(&pool, id)
///         .await?
///         .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
///     Ok(ApiResponse::ok("User fetched successfully", user))
/// }
/// ```

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use taskboard_shared::auth::{jwt::JwtError, password::PasswordError, session::AuthError};

use crate::{messages, response::Envelope};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),

    /// 401
    Unauthorized(String),

    /// 403
    Forbidden(String),

    /// 404
    NotFound(String),

    /// 409, e.g. duplicate email
    Conflict(String),

    /// 400; the failed fields are joined into the message
    ValidationError(Vec<ValidationErrorDetail>),

    /// 413
    PayloadTooLarge(String),

    /// 500; the message is logged, never sent
    InternalError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Detail of an internal error, attached to the response for the
/// error-detail layer
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation failures of one element of a batch, fields prefixed with
    /// its index (`[3].title`)
    pub fn validation_at(index: usize, errors: validator::ValidationErrors) -> Self {
        let details = validation_details(&errors)
            .into_iter()
            .map(|detail| ValidationErrorDetail {
                field: format!("[{}].{}", index, detail.field),
                message: detail.message,
            })
            .collect();
        ApiError::ValidationError(details)
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect();

    // field_errors() is a HashMap
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::ValidationError(details) => {
                let summary = details
                    .iter()
                    .map(|d| format!("{}: {}", d.field, d.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                let message = format!("Validation failed: {}", summary);
                let body = Envelope::<()>::new(status, message, None);
                (status, Json(body)).into_response()
            }
            ApiError::InternalError(detail) => {
                tracing::error!(error = %detail, "Internal error");
                let body = Envelope::<()>::new(status, messages::SERVER_ERROR, None);
                let mut response = (status, Json(body)).into_response();
                response.extensions_mut().insert(ErrorDetail(detail));
                response
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg) => {
                (status, Json(Envelope::<()>::new(status, msg, None))).into_response()
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some(constraint) if constraint.contains("email") => {
                        ApiError::Conflict("Email already exists".to_string())
                    }
                    Some(constraint) => {
                        ApiError::Conflict(format!("Constraint violation: {}", constraint))
                    }
                    None => ApiError::Conflict("Duplicate value".to_string()),
                }
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) | AuthError::UserNotFound => {
                ApiError::Unauthorized(messages::UNAUTHORIZED_ACCESS.to_string())
            }
            AuthError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(messages::UNAUTHORIZED_ACCESS.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&errors))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(format!("I/O error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}
