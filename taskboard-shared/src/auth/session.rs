/// Cookie-carried sessions
///
/// The signed session token travels in an HTTP-only cookie named `token`.
/// This module builds and clears that cookie, pulls the token back out of a
/// request and resolves it to the user it names.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use taskboard_shared::auth::session::{authenticate, CurrentUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) {
/// match authenticate(&pool, "jwt-secret", &headers).await {
///     Ok(user) => println!("request from {}", user.username),
///     Err(e) => println!("rejected: {}", e),
/// }
/// # }
/// ```

use axum::http::{header, HeaderMap};
use cookie::{time::OffsetDateTime, Cookie, SameSite};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, SESSION_TTL_DAYS};
use crate::models::user::{User, UserRole};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no session token")]
    MissingCredentials,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("session user no longer exists")]
    UserNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The authenticated caller, attached to the request by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Session cookie carrying `token`
///
/// HTTP-only, `SameSite=Strict`, path `/`, 30 days. `secure` should be set
/// in production.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(cookie::time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// A cookie that makes the browser drop the session
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(cookie::time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Finds the session token among the request's `Cookie` headers
///
/// Unparseable cookie pairs are skipped; an empty value counts as absent.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolves the request's session to a user
///
/// The token is checked before any database access, so forged or expired
/// tokens never cost a query.
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let token = token_from_headers(headers).ok_or(AuthError::MissingCredentials)?;

    let claims =
        validate_token(&token, secret).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(CurrentUser::from(&user))
}
