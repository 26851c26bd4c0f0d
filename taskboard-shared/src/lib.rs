//! # Taskboard Shared Library
//!
//! Persistence models, database plumbing and authentication primitives used
//! by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Users, tasks, comments and uploaded files
//! - `auth`: Password hashing, session tokens and cookie handling

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
