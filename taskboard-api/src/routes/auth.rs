/// Authentication endpoints
///
/// Sessions are cookie based: register and login set an HTTP-only `token`
/// cookie holding a signed session token, logout overwrites it with an
/// expired one.
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an account and start a session
/// - `POST /api/auth/login` - Start a session
/// - `POST /api/auth/logout` - End the session
/// - `GET /api/auth/me` - Profile of the session's user

use crate::{
    app::AppState,
    de,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    messages,
    response::ApiResponse,
};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use cookie::Cookie;
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        jwt, password,
        session::{expired_session_cookie, session_cookie, CurrentUser},
    },
    models::user::{CreateUser, User, UserProfile, UserRole},
};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1 to 50 characters"))]
    #[serde(deserialize_with = "de::text")]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    #[serde(deserialize_with = "de::text")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(deserialize_with = "de::text")]
    pub email: String,
    pub password: String,
}

/// Emails are compared case-insensitively by storing them lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is deliberately slow; keep it off the async workers
async fn hash_off_thread(plain: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn verify_off_thread(plain: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn with_cookie(cookie: Cookie<'static>, body: impl IntoResponse) -> ApiResult<Response> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))?;

    Ok(([(header::SET_COOKIE, value)], body).into_response())
}

fn start_session(
    state: &AppState,
    user: &User,
    status: StatusCode,
    message: &str,
) -> ApiResult<Response> {
    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;
    let cookie = session_cookie(token, state.config.api.production);

    let profile = UserProfile::from(user);
    let body = if status == StatusCode::CREATED {
        ApiResponse::created(message, profile)
    } else {
        ApiResponse::ok(message, profile)
    };

    with_cookie(cookie, body)
}

/// Registers a user
///
/// ```text
/// POST /api/auth/register
/// { "username": "ada", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Response> {
    let req = req.normalized();
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict(messages::USER_EXISTS.to_string()));
    }

    let password_hash = hash_off_thread(req.password).await?;

    // Two concurrent registrations can both pass the lookup above
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: UserRole::User,
        },
    )
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict(messages::USER_EXISTS.to_string()),
        other => other,
    })?;

    info!(user_id = %user.id, "User registered");

    start_session(&state, &user, StatusCode::CREATED, messages::REGISTER_SUCCESS)
}

/// Logs a user in
///
/// Unknown email and wrong password are indistinguishable to the caller.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let invalid = || ApiError::Unauthorized(messages::INVALID_CREDENTIALS.to_string());

    let user = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_off_thread(req.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");

    start_session(&state, &user, StatusCode::OK, messages::LOGIN_SUCCESS)
}

/// Clears the session cookie
///
/// Needs no session; the token itself stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> ApiResult<Response> {
    with_cookie(
        expired_session_cookie(state.config.api.production),
        ApiResponse::message(StatusCode::OK, messages::LOGOUT_SUCCESS),
    )
}

/// Returns the caller's profile, freshly read
///
/// # Errors
///
/// - `404 Not Found`: The account was removed after the session check
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<UserProfile>> {
    let user = User::find_by_id(&state.db, current.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::USER_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::ok(messages::USER_PROFILE, UserProfile::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            username: " ada ".to_string(),
            email: "Ada@Example.com".to_string(),
            password: "secret".to_string(),
        }
        .normalized();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.username, "ada");
        assert_eq!(ok.email, "ada@example.com");

        let short = RegisterRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "12345".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let blank = RegisterRequest {
            username: "   ".to_string(),
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        }
        .normalized();
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_credentials_reject_nul() {
        let register = r#"{"username": "a\u0000", "email": "a@b.io", "password": "secret"}"#;
        assert!(serde_json::from_str::<RegisterRequest>(register).is_err());

        let login = r#"{"email": "a@b.io\u0000", "password": "secret"}"#;
        assert!(serde_json::from_str::<LoginRequest>(login).is_err());
    }
}
