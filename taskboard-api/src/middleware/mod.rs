/// Middleware for the API server
///
/// - `session`: Cookie session gate and admin role gate
/// - `error_detail`: Exposes internal error detail outside production

pub mod error_detail;
pub mod session;
