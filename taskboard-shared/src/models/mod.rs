/// Database models for Taskboard
///
/// Each model exposes its CRUD operations as associated `async fn`s that take
/// the pool (or any executor) explicitly.
///
/// # Models
///
/// - `user`: Accounts, roles and the public profile projection
/// - `task`: Tasks, list filtering and dashboard counts
/// - `comment`: Ordered comments belonging to a task
/// - `file`: Uploaded file metadata and the task back-reference
///
/// # Serialization
///
/// Models serialize with camelCase keys and expose their primary key as
/// `_id`, which is the shape the browser client consumes.

pub mod comment;
pub mod file;
pub mod task;
pub mod user;
