//! # Taskboard API Server Library
//!
//! HTTP surface of Taskboard: cookie sessions, task management, user
//! administration, file uploads and dashboard statistics.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `response`: The `{success, statusCode, message, data}` envelope
//! - `messages`: Fixed response messages
//! - `extract`: JSON, query and path extractors that reject with `ApiError`
//! - `de`: Lenient deserializers for form-submitted fields
//! - `middleware`: Session gate, admin gate, development error detail
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod de;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod response;
pub mod routes;
