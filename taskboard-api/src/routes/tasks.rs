/// Task endpoints
///
/// Every authenticated user can see and change every task; there is no
/// ownership check beyond recording who created a task.
///
/// # Endpoints
///
/// - `GET /api/tasks` - Filtered, sorted, paginated list
/// - `POST /api/tasks` - Create a task
/// - `POST /api/tasks/bulk` - Create many tasks in one transaction
/// - `GET /api/tasks/:id` - Task with users, comments and files expanded
/// - `PUT /api/tasks/:id` - Replace the supplied fields
/// - `DELETE /api/tasks/:id` - Delete a task and its comments
/// - `POST /api/tasks/:id/comments` - Add a comment
///
/// # Attachments
///
/// Creating or updating a task with attachment ids also points those files
/// back at the task. That second write is best effort: a failure is logged
/// and the task write still succeeds.

use crate::{
    app::AppState,
    de,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    messages,
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::session::CurrentUser,
    models::{
        comment::{Comment, CommentView},
        file::File,
        task::{
            CreateTask, SortOrder, Task, TaskDetail, TaskPage, TaskPriority, TaskQuery,
            TaskSortField, TaskStatus, UpdateTask,
        },
        user::UserRef,
    },
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/tasks` and each element of `POST /api/tasks/bulk`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    #[serde(deserialize_with = "de::text")]
    pub title: String,

    #[serde(default, deserialize_with = "de::optional_text")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "de::optional_datetime")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de::optional_uuid")]
    pub assigned_to: Option<Uuid>,

    #[serde(default)]
    pub attachments: Vec<Uuid>,
}

impl CreateTaskRequest {
    /// Stamps the creator; whatever the client sent for it is ignored
    fn into_create(self, created_by: Uuid) -> CreateTask {
        CreateTask {
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            assigned_to: self.assigned_to,
            created_by,
            attachments: self.attachments,
        }
    }

    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }
}

/// Body of `PUT /api/tasks/:id`; absent fields are left alone
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    #[serde(default, deserialize_with = "de::optional_text")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "de::optional_text")]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    /// `null` or `""` clears the due date
    #[serde(default, deserialize_with = "de::nullable_datetime")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// `null` or `""` unassigns
    #[serde(default, deserialize_with = "de::nullable_uuid")]
    pub assigned_to: Option<Option<Uuid>>,

    pub attachments: Option<Vec<Uuid>>,
}

impl UpdateTaskRequest {
    fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self
    }
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            attachments: req.attachments,
        }
    }
}

/// Query string of `GET /api/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "de::optional_text")]
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
}

impl ListTasksParams {
    pub fn into_query(self) -> ApiResult<TaskQuery> {
        let defaults = TaskQuery::default();

        let page = self.page.unwrap_or(defaults.page);
        let limit = self.limit.unwrap_or(defaults.limit);
        if page < 1 || limit < 1 {
            return Err(ApiError::BadRequest(
                "page and limit must be positive integers".to_string(),
            ));
        }

        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => TaskSortField::default(),
            Some(field) => field
                .parse::<TaskSortField>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        };

        let query = TaskQuery {
            status: self.status,
            priority: self.priority,
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            page,
            limit,
            sort_by,
            order: self.order.unwrap_or_default(),
        };

        if query.checked_offset().is_none() {
            return Err(ApiError::BadRequest("page and limit are too large".to_string()));
        }

        Ok(query)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    #[serde(deserialize_with = "de::text")]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub count: usize,
}

/// Points the given files at `task_id`; failures are logged, not returned
async fn link_attachments(state: &AppState, task_id: Uuid, attachments: &[Uuid]) {
    if attachments.is_empty() {
        return;
    }

    match File::attach_to_task(&state.db, task_id, attachments).await {
        Ok(linked) => debug!(%task_id, linked, "Linked attachments to task"),
        Err(e) => warn!(%task_id, error = %e, "Failed to link attachments to task"),
    }
}

/// Creates a task owned by the caller
///
/// ```text
/// POST /api/tasks
/// { "title": "Ship it", "priority": "high", "dueDate": "2025-06-01", "attachments": [] }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    let req = req.trimmed();
    req.validate()?;

    let task = Task::create(&state.db, req.into_create(user.id)).await?;
    link_attachments(&state, task.id, &task.attachments).await;

    info!(task_id = %task.id, user_id = %user.id, "Task created");
    Ok(ApiResponse::created(messages::TASK_CREATED, task))
}

/// Lists tasks
///
/// ```text
/// GET /api/tasks?status=pending&priority=high&search=deploy&page=2&limit=5&sort_by=dueDate&order=asc
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown enum value, unknown sort field, page/limit
///   below 1 or so large the offset overflows
pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListTasksParams>,
) -> ApiResult<ApiResponse<TaskPage>> {
    let query = params.into_query()?;
    let page = Task::list(&state.db, &query).await?;

    Ok(ApiResponse::ok(messages::TASKS_FETCHED, page))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<TaskDetail>> {
    let task = Task::find_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::TASK_NOT_FOUND.to_string()))?;

    Ok(ApiResponse::ok(messages::TASK_DETAILS, task))
}

/// Overwrites the fields present in the body
///
/// Concurrent updates are not detected; the last write wins.
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    let req = req.trimmed();
    req.validate()?;

    let update = UpdateTask::from(req);
    let relink = update.attachments.is_some();

    let task = Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::TASK_NOT_FOUND.to_string()))?;

    if relink {
        link_attachments(&state, task.id, &task.attachments).await;
    }

    info!(task_id = %task.id, "Task updated");
    Ok(ApiResponse::ok(messages::TASK_UPDATED, task))
}

/// Deletes a task; attached files stay on disk and in the files table
pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse> {
    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(messages::TASK_NOT_FOUND.to_string()));
    }

    info!(task_id = %id, "Task deleted");
    Ok(ApiResponse::message(StatusCode::OK, messages::TASK_DELETED))
}

/// Creates every task in the body or none of them
///
/// # Errors
///
/// - `400 Bad Request`: Any element fails validation (fields are prefixed
///   with the element's index)
pub async fn bulk_create_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(items): ApiJson<Vec<CreateTaskRequest>>,
) -> ApiResult<ApiResponse<BulkCreateResponse>> {
    let mut batch = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let item = item.trimmed();
        item.validate()
            .map_err(|errors| ApiError::validation_at(index, errors))?;
        batch.push(item.into_create(user.id));
    }

    let created = Task::create_many(&state.db, batch).await?;

    info!(count = created.len(), user_id = %user.id, "Tasks bulk created");
    Ok(ApiResponse::created(
        messages::TASKS_BULK_CREATED,
        BulkCreateResponse {
            count: created.len(),
        },
    ))
}

/// Appends a comment by the caller
///
/// # Errors
///
/// - `404 Not Found`: No such task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddCommentRequest>,
) -> ApiResult<ApiResponse<CommentView>> {
    let req = AddCommentRequest {
        content: req.content.trim().to_string(),
    };
    req.validate()?;

    let not_found = || ApiError::NotFound(messages::TASK_NOT_FOUND.to_string());

    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(not_found());
    }

    let comment = Comment::create(&state.db, id, user.id, &req.content)
        .await
        .map_err(|e| match e {
            // Task deleted between the lookup and the insert
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => not_found(),
            other => ApiError::from(other),
        })?;

    let author = UserRef {
        id: user.id,
        username: user.username.clone(),
        email: None,
    };

    Ok(ApiResponse::created(
        messages::COMMENT_ADDED,
        CommentView::with_author(comment, author),
    ))
}
