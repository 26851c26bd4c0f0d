/// Task model and database operations
///
/// Tasks are the core entity: any authenticated user may create, edit or
/// delete any task. `created_by` and `assigned_to` are bare user ids without
/// foreign keys, and `attachments` is an array of file ids kept alongside the
/// per-file `task_id` back-reference. The two sides are written separately and
/// can drift apart.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     assigned_to UUID,
///     created_by UUID NOT NULL,
///     attachments UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, TaskPriority, TaskQuery, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     priority: TaskPriority::High,
///     ..CreateTask::new(user_id)
/// })
/// .await?;
///
/// let page = Task::list(&pool, &TaskQuery {
///     status: Some(TaskStatus::Pending),
///     ..Default::default()
/// })
/// .await?;
/// assert!(page.total >= 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::comment::{Comment, CommentView};
use super::file::File;
use super::user::UserRef;

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, assigned_to, \
                            created_by, attachments, created_at, updated_at";

/// Workflow status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    #[sqlx(rename = "pending")]
    Pending,

    #[serde(rename = "in-progress")]
    #[sqlx(rename = "in-progress")]
    InProgress,

    #[serde(rename = "completed")]
    #[sqlx(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Priority; sorts low < medium < high
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// A task row as stored
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    /// File ids, in the order the client supplied them
    pub attachments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub attachments: Vec<Uuid>,
}

impl CreateTask {
    /// Defaults for everything except the creator
    pub fn new(created_by: Uuid) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            assigned_to: None,
            created_by,
            attachments: Vec::new(),
        }
    }
}

/// Replacement values for an existing task
///
/// `None` leaves a column alone. The nested options on nullable columns
/// distinguish "not supplied" from "clear it".
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assigned_to: Option<Option<Uuid>>,
    pub attachments: Option<Vec<Uuid>>,
}

/// Columns a task list can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
    Status,
    Priority,
}

impl TaskSortField {
    fn column(&self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "t.created_at",
            TaskSortField::UpdatedAt => "t.updated_at",
            TaskSortField::DueDate => "t.due_date",
            TaskSortField::Title => "t.title",
            TaskSortField::Status => "t.status",
            TaskSortField::Priority => "t.priority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortField(pub String);

impl fmt::Display for UnknownSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot sort tasks by '{}'", self.0)
    }
}

impl std::error::Error for UnknownSortField {}

impl FromStr for TaskSortField {
    type Err = UnknownSortField;

    /// Accepts the client's camelCase names and their snake_case spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(TaskSortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(TaskSortField::UpdatedAt),
            "dueDate" | "due_date" => Ok(TaskSortField::DueDate),
            "title" => Ok(TaskSortField::Title),
            "status" => Ok(TaskSortField::Status),
            "priority" => Ok(TaskSortField::Priority),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter, sort and page parameters for [`Task::list`]
///
/// `page` and `limit` are expected to be at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
    pub sort_by: TaskSortField,
    pub order: SortOrder,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            page: 1,
            limit: 10,
            sort_by: TaskSortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl TaskQuery {
    /// Rows skipped before this page, `None` when it does not fit in `i64`
    pub fn checked_offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.limit)
    }

    /// Like [`checked_offset`](Self::checked_offset), saturating instead;
    /// a saturated offset simply selects no rows.
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX).max(0)
    }

    /// Number of pages needed for `total` items
    pub fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total - 1) / self.limit.max(1) + 1
    }

    fn push_filters(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");

        if let Some(status) = self.status {
            query.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = self.priority {
            query.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            query
                .push(" AND (t.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR t.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Escapes LIKE metacharacters so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A task with its user references expanded
///
/// `A` is the attachment representation: bare ids in lists, full file
/// records in the detail view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView<A = Uuid> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<UserRef>,
    pub created_by: Option<UserRef>,
    pub attachments: Vec<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully expanded task: comments and attachment metadata included
pub type TaskDetail = TaskView<File>;

/// One page of [`Task::list`]
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<TaskView>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(sqlx::FromRow)]
struct ExpandedTaskRow {
    #[sqlx(flatten)]
    task: Task,
    assignee_id: Option<Uuid>,
    assignee_username: Option<String>,
    assignee_email: Option<String>,
    creator_id: Option<Uuid>,
    creator_username: Option<String>,
    creator_email: Option<String>,
}

impl From<ExpandedTaskRow> for TaskView {
    fn from(row: ExpandedTaskRow) -> Self {
        let task = row.task;
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            assigned_to: UserRef::from_join(
                row.assignee_id,
                row.assignee_username,
                row.assignee_email,
            ),
            created_by: UserRef::from_join(row.creator_id, row.creator_username, row.creator_email),
            attachments: task.attachments,
            comments: None,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

const EXPANDED_SELECT: &str = "SELECT t.*, \
     a.id AS assignee_id, a.username AS assignee_username, a.email AS assignee_email, \
     c.id AS creator_id, c.username AS creator_username, c.email AS creator_email \
     FROM tasks t \
     LEFT JOIN users a ON a.id = t.assigned_to \
     LEFT JOIN users c ON c.id = t.created_by";

impl Task {
    /// Inserts one task
    ///
    /// Generic over the executor so a batch can share a transaction.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO tasks
                (title, description, status, priority, due_date, assigned_to, created_by, attachments)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.assigned_to)
            .bind(data.created_by)
            .bind(data.attachments)
            .fetch_one(executor)
            .await
    }

    /// Inserts every task in one transaction; all or nothing
    pub async fn create_many(pool: &PgPool, items: Vec<CreateTask>) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            created.push(Self::create(&mut *tx, item).await?);
        }

        tx.commit().await?;
        debug!(count = created.len(), "Bulk inserted tasks");
        Ok(created)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads a task with assignee, creator, comment authors and attachment
    /// metadata expanded
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        let query = format!("{EXPANDED_SELECT} WHERE t.id = $1");

        let Some(row) = sqlx::query_as::<_, ExpandedTaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let view = TaskView::from(row);
        let attachments = File::find_by_ids(pool, &view.attachments).await?;
        let comments = Comment::list_for_task(pool, id).await?;

        Ok(Some(TaskView {
            id: view.id,
            title: view.title,
            description: view.description,
            status: view.status,
            priority: view.priority,
            due_date: view.due_date,
            assigned_to: view.assigned_to,
            created_by: view.created_by,
            attachments,
            comments: Some(comments),
            created_at: view.created_at,
            updated_at: view.updated_at,
        }))
    }

    /// Filters, sorts and pages tasks; returns the page plus the total match
    /// count
    ///
    /// The page and the count are two separate reads.
    pub async fn list(pool: &PgPool, params: &TaskQuery) -> Result<TaskPage, sqlx::Error> {
        let mut select: QueryBuilder<Postgres> = QueryBuilder::new(EXPANDED_SELECT);
        params.push_filters(&mut select);
        select
            .push(" ORDER BY ")
            .push(params.sort_by.column())
            .push(" ")
            .push(params.order.as_sql())
            .push(" NULLS LAST, t.id ")
            .push(params.order.as_sql())
            .push(" LIMIT ")
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = select
            .build_query_as::<ExpandedTaskRow>()
            .fetch_all(pool)
            .await?;

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        params.push_filters(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

        debug!(total, page = params.page, limit = params.limit, "Listed tasks");

        Ok(TaskPage {
            tasks: rows.into_iter().map(TaskView::from).collect(),
            total,
            page: params.page,
            pages: params.page_count(total),
        })
    }

    /// Overwrites the supplied columns in one statement
    ///
    /// Returns `None` when no task has this id. Concurrent writers race;
    /// the last statement wins.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = data.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            query.push(", assigned_to = ").push_bind(assigned_to);
        }
        if let Some(attachments) = data.attachments {
            query.push(", attachments = ").push_bind(attachments);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        query.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Deletes a task and its comments; attached files are untouched
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await
    }

    pub async fn count_with_status(pool: &PgPool, status: TaskStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    pub async fn count_with_priority(
        pool: &PgPool,
        priority: TaskPriority,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE priority = $1")
            .bind(priority)
            .fetch_one(pool)
            .await
    }

    /// Tasks due strictly before `now` that are not completed
    pub async fn count_overdue(pool: &PgPool, now: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE due_date < $1 AND status <> $2")
            .bind(now)
            .bind(TaskStatus::Completed)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
        assert!(serde_json::from_str::<TaskStatus>("\"in_progress\"").is_err());

        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_priority_defaults_and_names() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        for priority in TaskPriority::ALL {
            let json = serde_json::to_string(&priority).unwrap();
            assert_eq!(json, format!("\"{}\"", priority.as_str()));
        }
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("createdAt".parse(), Ok(TaskSortField::CreatedAt));
        assert_eq!("due_date".parse(), Ok(TaskSortField::DueDate));
        assert_eq!("priority".parse(), Ok(TaskSortField::Priority));

        let err = "password_hash".parse::<TaskSortField>().unwrap_err();
        assert_eq!(err.to_string(), "cannot sort tasks by 'password_hash'");
    }

    #[test]
    fn test_page_math() {
        let query = TaskQuery {
            page: 2,
            limit: 5,
            ..Default::default()
        };
        assert_eq!(query.offset(), 5);
        assert_eq!(query.page_count(12), 3);
        assert_eq!(query.page_count(10), 2);
        assert_eq!(query.page_count(0), 0);
    }

    #[test]
    fn test_page_math_at_the_limits() {
        let huge_limit = TaskQuery {
            limit: i64::MAX,
            ..Default::default()
        };
        assert_eq!(huge_limit.checked_offset(), Some(0));
        assert_eq!(huge_limit.page_count(12), 1);
        assert_eq!(huge_limit.page_count(i64::MAX), 1);

        let huge_page = TaskQuery {
            page: i64::MAX / 2,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(huge_page.checked_offset(), None);
        assert_eq!(huge_page.offset(), i64::MAX);
        assert_eq!(huge_page.page_count(12), 2);

        let last_page = TaskQuery {
            page: i64::MAX,
            limit: 1,
            ..Default::default()
        };
        assert_eq!(last_page.checked_offset(), Some(i64::MAX - 1));
    }

    #[test]
    fn test_query_defaults() {
        let query = TaskQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.sort_by, TaskSortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_filters_render_placeholders() {
        let query = TaskQuery {
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::High),
            search: Some("deploy".to_string()),
            ..Default::default()
        };

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        query.push_filters(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM tasks t WHERE TRUE AND t.status = $1 AND t.priority = $2 \
             AND (t.title ILIKE $3 OR t.description ILIKE $4)"
        );
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let query = TaskQuery {
            search: Some(String::new()),
            ..Default::default()
        };

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM tasks t");
        query.push_filters(&mut builder);
        assert_eq!(builder.sql(), "SELECT 1 FROM tasks t WHERE TRUE");
    }

    #[test]
    fn test_create_task_defaults() {
        let creator = Uuid::new_v4();
        let data = CreateTask::new(creator);
        assert_eq!(data.created_by, creator);
        assert_eq!(data.status, TaskStatus::Pending);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert!(data.attachments.is_empty());
    }
}
