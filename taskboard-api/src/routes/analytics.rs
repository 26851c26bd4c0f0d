/// Dashboard statistics
///
/// ```text
/// GET /api/analytics/dashboard
/// ```
///
/// ```json
/// {
///   "tasks": { "total": 10, "pending": 4, "inProgress": 3, "completed": 3 },
///   "priority": { "low": 2, "medium": 5, "high": 3 },
///   "overdue": 2
/// }
/// ```
///
/// Each number is its own count query, run concurrently. The figures are not
/// taken from one snapshot and may disagree slightly under concurrent writes.

use crate::{app::AppState, error::ApiResult, messages, response::ApiResponse};
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskboard_shared::models::task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub tasks: TaskCounts,
    pub priority: PriorityCounts,

    /// Due before now and not completed
    pub overdue: i64,
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<ApiResponse<DashboardStats>> {
    let db = &state.db;

    let (total, pending, in_progress, completed, low, medium, high, overdue) = tokio::try_join!(
        Task::count(db),
        Task::count_with_status(db, TaskStatus::Pending),
        Task::count_with_status(db, TaskStatus::InProgress),
        Task::count_with_status(db, TaskStatus::Completed),
        Task::count_with_priority(db, TaskPriority::Low),
        Task::count_with_priority(db, TaskPriority::Medium),
        Task::count_with_priority(db, TaskPriority::High),
        Task::count_overdue(db, Utc::now()),
    )?;

    let stats = DashboardStats {
        tasks: TaskCounts {
            total,
            pending,
            in_progress,
            completed,
        },
        priority: PriorityCounts { low, medium, high },
        overdue,
    };

    Ok(ApiResponse::ok(messages::DASHBOARD_STATS_FETCHED, stats))
}
