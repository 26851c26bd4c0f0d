/// Session and role gates
///
/// `protect` resolves the `token` cookie to a [`CurrentUser`] and stores it in
/// the request extensions; handlers read it back with
/// `Extension<CurrentUser>`. `require_admin` must run after `protect`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskboard_api::app::AppState;
/// use taskboard_api::middleware::session::{protect, require_admin};
///
/// fn users(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/", get(|| async { "admins only" }))
///         // route_layer: last added runs first
///         .route_layer(middleware::from_fn(require_admin))
///         .route_layer(middleware::from_fn_with_state(state, protect))
/// }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskboard_shared::auth::session::{self, CurrentUser};
use tracing::debug;

use crate::{app::AppState, error::ApiError, messages};

/// Rejects requests without a valid session with 401
pub async fn protect(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session::authenticate(&state.db, state.jwt_secret(), req.headers())
        .await
        .map_err(|e| {
            debug!(error = %e, path = %req.uri().path(), "Rejected session");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Rejects non-admin callers with 403
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    match req.extensions().get::<CurrentUser>() {
        Some(user) if user.is_admin() => Ok(next.run(req).await),
        Some(user) => {
            debug!(user_id = %user.id, "Admin route refused");
            Err(ApiError::Forbidden(messages::UNAUTHORIZED_ACCESS.to_string()))
        }
        None => Err(ApiError::Unauthorized(
            messages::UNAUTHORIZED_ACCESS.to_string(),
        )),
    }
}
