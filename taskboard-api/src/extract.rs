/// Extractors whose rejections render as the response envelope
///
/// Thin wrappers over axum's `Json`, `Query` and `Path`. A malformed body,
/// query string or path parameter becomes an [`ApiError::BadRequest`]
/// instead of axum's plain-text rejection.
///
/// [`ApiError::BadRequest`]: crate::error::ApiError::BadRequest

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
