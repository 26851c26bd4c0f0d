/// File upload endpoint
///
/// ```text
/// POST /api/upload
/// Content-Type: multipart/form-data; boundary=...
///
/// --...
/// Content-Disposition: form-data; name="file"; filename="report.pdf"
/// Content-Type: application/pdf
/// ```
///
/// The part named `file` is streamed to `<UPLOAD_DIR>/<uuid>-<name>` and its
/// metadata recorded. Stored files are served back under `/uploads/<name>`.
/// The request body limit is the only size restriction; there is no type
/// filtering.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    messages,
    response::ApiResponse,
};
use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    Extension,
};
use std::path::Path;
use taskboard_shared::{
    auth::session::CurrentUser,
    models::file::{CreateFile, File},
};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

const DEFAULT_MIMETYPE: &str = "application/octet-stream";
const MAX_NAME_CHARS: usize = 100;

/// Reduces a client-supplied file name to a safe single path component
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_CHARS)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Streams one multipart field to `path`, returning the byte count
async fn write_field(mut field: Field<'_>, path: &Path) -> ApiResult<i64> {
    let mut out = tokio::fs::File::create(path).await?;
    let mut size: i64 = 0;

    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as i64;
        out.write_all(&chunk).await?;
    }

    out.flush().await?;
    Ok(size)
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
    }
}

/// Stores the uploaded file and records it
///
/// # Errors
///
/// - `400 Bad Request`: Not multipart, or no `file` part
/// - `413 Payload Too Large`: Body over the configured limit
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<File>> {
    let mut multipart = multipart?;
    let upload_dir = &state.config.upload.dir;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let mimetype = field
            .content_type()
            .unwrap_or(DEFAULT_MIMETYPE)
            .to_string();

        let filename = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&original));
        let path = upload_dir.join(&filename);

        tokio::fs::create_dir_all(upload_dir).await?;

        let size = match write_field(field, &path).await {
            Ok(size) => size,
            Err(e) => {
                discard(&path).await;
                return Err(e);
            }
        };

        let record = File::create(
            &state.db,
            CreateFile {
                filename,
                filepath: path.to_string_lossy().into_owned(),
                mimetype,
                size,
                uploaded_by: user.id,
            },
        )
        .await;

        let file = match record {
            Ok(file) => file,
            Err(e) => {
                discard(&path).await;
                return Err(e.into());
            }
        };

        info!(file_id = %file.id, size, user_id = %user.id, "File uploaded");
        return Ok(ApiResponse::created(messages::FILE_UPLOADED, file));
    }

    Err(ApiError::BadRequest(messages::NO_FILE_UPLOADED.to_string()))
}
