/// Response envelope
///
/// Every JSON body the server produces, success or failure, has the same
/// shape:
///
/// ```json
/// {
///   "success": true,
///   "statusCode": 200,
///   "message": "Task details",
///   "data": { "...": "..." }
/// }
/// ```
///
/// `success` is derived from the status code (`< 400`), so the two can
/// never disagree. `data` is `null` when there is nothing to return.
///
/// # Example
///
/// ```
/// use taskboard_api::response::ApiResponse;
/// use serde_json::json;
///
/// let created = ApiResponse::created("Task created successfully", json!({ "_id": "..." }));
/// let deleted = ApiResponse::message(axum::http::StatusCode::OK, "Task deleted successfully");
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// The wire shape of every response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: status.as_u16() < 400,
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }
}

/// A successful handler result, rendered as an [`Envelope`]
#[derive(Debug)]
pub struct ApiResponse<T = ()> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 with a payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A response carrying only a message; `data` is `null`
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope::new(self.status, self.message, self.data);
        (self.status, Json(body)).into_response()
    }
}
