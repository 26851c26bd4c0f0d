/// Task comments
///
/// Comments form an ordered sequence owned by one task and are removed
/// together with it (`ON DELETE CASCADE`). Authors are plain user ids.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRef;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub task_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment with its author expanded to `{_id, username}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// `None` when the author no longer exists
    pub user: Option<UserRef>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_username: Option<String>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            user: UserRef::from_join(row.author_id, row.author_username, None),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

impl Comment {
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO task_comments (task_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, content, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// Comments of a task in posting order, authors expanded
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.content, c.created_at,
                   u.id AS author_id, u.username AS author_username
            FROM task_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(CommentView::from).collect())
    }
}

impl CommentView {
    /// Expands a freshly written comment with an already known author
    pub fn with_author(comment: Comment, author: UserRef) -> Self {
        Self {
            id: comment.id,
            user: Some(author),
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}
