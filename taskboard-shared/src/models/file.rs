/// Uploaded file metadata
///
/// The bytes live on local disk; this table records where, and which task
/// (if any) the file was last attached to.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE files (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     filename VARCHAR(255) NOT NULL,
///     filepath VARCHAR(1024) NOT NULL,
///     mimetype VARCHAR(255) NOT NULL,
///     size BIGINT NOT NULL,
///     uploaded_by UUID NOT NULL,
///     task_id UUID,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

const FILE_COLUMNS: &str =
    "id, filename, filepath, mimetype, size, uploaded_by, task_id, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Name of the stored file inside the upload directory
    pub filename: String,

    /// Path the bytes were written to, relative to the server's working dir
    pub filepath: String,

    pub mimetype: String,

    /// Size in bytes
    pub size: i64,

    pub uploaded_by: Uuid,

    /// Back-reference to a task; may be stale
    #[serde(rename = "task")]
    pub task_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFile {
    pub filename: String,
    pub filepath: String,
    pub mimetype: String,
    pub size: i64,
    pub uploaded_by: Uuid,
}

impl File {
    pub async fn create(pool: &PgPool, data: CreateFile) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO files (filename, filepath, mimetype, size, uploaded_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FILE_COLUMNS}"
        );

        sqlx::query_as::<_, File>(&query)
            .bind(data.filename)
            .bind(data.filepath)
            .bind(data.mimetype)
            .bind(data.size)
            .bind(data.uploaded_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1");

        sqlx::query_as::<_, File>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads the files among `ids`, in the order the ids are given
    ///
    /// Unknown ids are skipped.
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE id = ANY($1)
             ORDER BY array_position($1, id)"
        );

        sqlx::query_as::<_, File>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Points every file in `ids` at `task_id`
    ///
    /// Returns how many rows changed. Files previously attached elsewhere are
    /// simply re-pointed; nothing clears the reference of files dropped from
    /// a task.
    pub async fn attach_to_task(
        pool: &PgPool,
        task_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE files SET task_id = $1, updated_at = NOW() WHERE id = ANY($2)",
        )
        .bind(task_id)
        .bind(ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
