/// API route handlers, one module per resource
///
/// - `health`: Liveness and health check
/// - `auth`: Register, login, logout, current user
/// - `tasks`: Task CRUD, bulk create, comments
/// - `users`: User administration
/// - `uploads`: Multipart file upload
/// - `analytics`: Dashboard counts

pub mod analytics;
pub mod auth;
pub mod health;
pub mod tasks;
pub mod uploads;
pub mod users;
