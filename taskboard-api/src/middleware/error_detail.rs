/// Development-mode error detail
///
/// Internal errors are answered with a generic message. When this layer is
/// enabled it looks for the [`ErrorDetail`] extension an internal error
/// leaves on its response and re-renders the envelope with the detail in
/// `data`. Production deployments leave it disabled.
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use taskboard_api::middleware::error_detail::ErrorDetailLayer;
///
/// let app: Router = Router::new().layer(ErrorDetailLayer::new(true));
/// ```

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::{error::ErrorDetail, messages, response::Envelope};

#[derive(Clone)]
pub struct ErrorDetailLayer {
    expose: bool,
}

impl ErrorDetailLayer {
    /// `expose` should be `!production`
    pub fn new(expose: bool) -> Self {
        Self { expose }
    }
}

impl<S> Layer<S> for ErrorDetailLayer {
    type Service = ErrorDetailMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorDetailMiddleware {
            inner,
            expose: self.expose,
        }
    }
}

#[derive(Clone)]
pub struct ErrorDetailMiddleware<S> {
    inner: S,
    expose: bool,
}

impl<S> Service<Request> for ErrorDetailMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let expose = self.expose;

        Box::pin(async move {
            let response = future.await?;

            if !expose {
                return Ok(response);
            }

            match response.extensions().get::<ErrorDetail>().cloned() {
                Some(ErrorDetail(detail)) => {
                    let status = response.status();
                    let body = Envelope::new(status, messages::SERVER_ERROR, Some(detail));
                    Ok((status, Json(body)).into_response())
                }
                None => Ok(response),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use axum::{body::to_bytes, body::Body, http::StatusCode, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn failing() -> Result<&'static str, ApiError> {
        Err(ApiError::InternalError("relation \"tasks\" does not exist".to_string()))
    }

    async fn call(expose: bool, uri: &str) -> (StatusCode, Value) {
        let app = Router::new()
            .route("/fail", get(failing))
            .route("/missing", get(|| async { ApiError::NotFound("Task not found".into()) }))
            .layer(ErrorDetailLayer::new(expose));

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_detail_exposed_in_development() {
        let (status, body) = call(true, "/fail").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], messages::SERVER_ERROR);
        assert_eq!(body["data"], "relation \"tasks\" does not exist");
    }

    #[tokio::test]
    async fn test_detail_hidden_in_production() {
        let (status, body) = call(false, "/fail").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_other_errors_untouched() {
        let (status, body) = call(true, "/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
        assert!(body["data"].is_null());
    }
}
