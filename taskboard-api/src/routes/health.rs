/// Liveness and health endpoints
///
/// # Endpoints
///
/// - `GET /` answers "API is running" without touching the database
/// - `GET /health` also runs `SELECT 1`
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "statusCode": 200,
///   "message": "healthy",
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// }
/// ```

use crate::{app::AppState, messages, response::ApiResponse};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use taskboard_shared::db::pool;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

pub async fn root() -> ApiResponse {
    ApiResponse::message(StatusCode::OK, messages::API_RUNNING)
}

/// Reports version and database reachability
///
/// Always 200; a database outage shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let status = if connected { "healthy" } else { "degraded" };

    ApiResponse::ok(
        status,
        HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if connected { "connected" } else { "disconnected" }.to_string(),
        },
    )
}
