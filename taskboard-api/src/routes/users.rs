/// User administration endpoints (admin only)
///
/// # Endpoints
///
/// - `GET /api/users` - Every user, no pagination
/// - `GET /api/users/:id` - One user
/// - `PUT /api/users/:id` - Change username, email or role
/// - `DELETE /api/users/:id` - Hard delete
///
/// Admins may demote or delete themselves. Tasks and files keep pointing at
/// deleted users; those references expand to `null`.

use crate::{
    app::AppState,
    de,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    messages,
    response::ApiResponse,
    routes::auth::normalize_email,
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use taskboard_shared::models::user::{UpdateUser, User, UserRole};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1 to 50 characters"))]
    #[serde(default, deserialize_with = "de::optional_text")]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    #[serde(default, deserialize_with = "de::optional_text")]
    pub email: Option<String>,

    pub role: Option<UserRole>,
}

impl UpdateUserRequest {
    fn normalized(self) -> Self {
        Self {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            role: self.role,
        }
    }
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            role: req.role,
        }
    }
}

fn user_not_found() -> ApiError {
    ApiError::NotFound(messages::USER_NOT_FOUND.to_string())
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<User>>> {
    let users = User::list_all(&state.db).await?;
    Ok(ApiResponse::ok(messages::USERS_FETCHED, users))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<User>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ApiResponse::ok(messages::USER_FETCHED, user))
}

/// Updates the supplied fields
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: No such user
/// - `409 Conflict`: The new email belongs to another user
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    let req = req.normalized();
    req.validate()?;

    let update = UpdateUser::from(req);
    let user = if update.is_empty() {
        User::find_by_id(&state.db, id).await?
    } else {
        User::update(&state.db, id, update).await?
    }
    .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, role = user.role.as_str(), "User updated");
    Ok(ApiResponse::ok(messages::USER_UPDATED, user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse> {
    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }

    info!(user_id = %id, "User deleted");
    Ok(ApiResponse::message(StatusCode::OK, messages::USER_DELETED))
}
