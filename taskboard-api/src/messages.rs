/// Human-readable messages placed in the response envelope
///
/// The browser client shows these verbatim in toasts.

pub const API_RUNNING: &str = "API is running";

pub const REGISTER_SUCCESS: &str = "User registered successfully";
pub const LOGIN_SUCCESS: &str = "User logged in successfully";
pub const LOGOUT_SUCCESS: &str = "User logged out successfully";
pub const USER_EXISTS: &str = "User already exists";
pub const USER_PROFILE: &str = "User profile";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access";

pub const TASK_CREATED: &str = "Task created successfully";
pub const TASKS_BULK_CREATED: &str = "Tasks bulk created successfully";
pub const TASKS_FETCHED: &str = "Tasks fetched successfully";
pub const TASK_DETAILS: &str = "Task details";
pub const TASK_UPDATED: &str = "Task updated successfully";
pub const TASK_DELETED: &str = "Task deleted successfully";
pub const TASK_NOT_FOUND: &str = "Task not found";
pub const COMMENT_ADDED: &str = "Comment added successfully";

pub const USERS_FETCHED: &str = "Users fetched successfully";
pub const USER_FETCHED: &str = "User fetched successfully";
pub const USER_UPDATED: &str = "User updated successfully";
pub const USER_DELETED: &str = "User deleted successfully";
pub const USER_NOT_FOUND: &str = "User not found";

pub const FILE_UPLOADED: &str = "File uploaded successfully";
pub const NO_FILE_UPLOADED: &str = "No file uploaded";

pub const DASHBOARD_STATS_FETCHED: &str = "Dashboard stats fetched successfully";

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const SERVER_ERROR: &str = "Internal Server Error";
