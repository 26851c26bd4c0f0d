/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    messages,
    middleware::{
        error_detail::ErrorDetailLayer,
        session::{protect, require_admin},
    },
    routes,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET  /                          # liveness
/// ├── GET  /health                    # health report
/// ├── GET  /uploads/*                 # stored files
/// └── /api
///     ├── /auth
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   └── GET  /me                # session
///     ├── /tasks                      # session
///     │   ├── GET|POST /
///     │   ├── POST /bulk
///     │   ├── GET|PUT|DELETE /:id
///     │   └── POST /:id/comments
///     ├── /users                      # session + admin
///     │   ├── GET /
///     │   └── GET|PUT|DELETE /:id
///     ├── GET  /analytics/dashboard   # session
///     └── POST /upload                # session
/// ```
///
/// # Middleware Stack
///
/// Outermost first: CORS, request tracing, error detail (development
/// only), then the per-router session and admin gates.
pub fn build_router(state: AppState) -> Router {
    let session = || from_fn_with_state(state.clone(), protect);

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(session())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/bulk", post(routes::tasks::bulk_create_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/comments", post(routes::tasks::add_comment))
        .route_layer(session());

    // route_layer: the last one added runs first
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route_layer(from_fn(require_admin))
        .route_layer(session());

    let analytics_routes = Router::new()
        .route("/dashboard", get(routes::analytics::dashboard))
        .route_layer(session());

    let upload_routes = Router::new()
        .route("/", post(routes::uploads::upload_file))
        .route_layer(session())
        .layer(DefaultBodyLimit::max(state.config.upload.max_bytes));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .nest("/analytics", analytics_routes)
        .nest("/upload", upload_routes);

    let cors = if state.config.cors_permissive() {
        // Credentials cannot be combined with a wildcard origin
        CorsLayer::very_permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload.dir))
        .fallback(not_found)
        .layer(ErrorDetailLayer::new(!state.config.api.production))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound(messages::ROUTE_NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, UploadConfig};
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::StatusCode,
    };
    use serde_json::Value;
    use taskboard_shared::db::pool::{create_lazy_pool, DatabaseConfig as PoolConfig};
    use tower::ServiceExt;

    /// Router over a pool that never connects; only routes that fail before
    /// touching the database can be exercised here
    fn offline_router(production: bool) -> Router {
        let pool = create_lazy_pool(&PoolConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            acquire_timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["http://localhost:5173".to_string()],
                production,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "router-test-secret-at-least-32-bytes".to_string(),
            },
            upload: UploadConfig {
                dir: std::env::temp_dir().join("taskboard-router-tests"),
                max_bytes: 1024,
            },
        };

        build_router(AppState::new(pool, config))
    }

    async fn send(router: Router, request: Request) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_is_public() {
        let (status, body) = send(offline_router(false), get("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], messages::API_RUNNING);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_session() {
        for uri in [
            "/api/tasks",
            "/api/users",
            "/api/analytics/dashboard",
            "/api/auth/me",
        ] {
            let (status, body) = send(offline_router(false), get(uri)).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], messages::UNAUTHORIZED_ACCESS);
            assert!(body["data"].is_null());
        }
    }

    #[tokio::test]
    async fn test_forged_cookie_is_rejected() {
        let request = Request::builder()
            .uri("/api/tasks")
            .header(header::COOKIE, "token=not.a.jwt")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(offline_router(false), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(offline_router(false), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();

        let response = offline_router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap();

        let (status, body) = send(offline_router(false), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(offline_router(false), get("/api/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], messages::ROUTE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend_with_credentials() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/tasks")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = offline_router(false).oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
