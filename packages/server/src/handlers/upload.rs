use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::content::UploadResponse;
use crate::state::AppState;

/// Folders content uploads may be placed in. Submission files live elsewhere.
const FOLDERS: &[&str] = &[
    "news",
    "achievements",
    "downloads",
    "carousel",
    "directors",
    "general",
];

const EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "zip",
];

/// Body limit for the upload route (32MB).
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/uploads",
    tag = "Uploads",
    operation_id = "uploadFile",
    summary = "Upload an image or document for content records",
    description = "`multipart/form-data` with a `file` part and a `folder` part (`news`, `achievements`, `downloads`, `carousel`, `directors` or `general`). Returns the stored relative path to put in `thumbnail_path`, `image_path`, `file_path` or `photo_path`. Requires `content:manage` permission.",
    request_body(content_type = "multipart/form-data", description = "`file` and `folder` parts"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.username))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("content:manage")?;

    let max_size = state.config.storage.max_upload_size;
    let mut folder: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("folder") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read folder: {e}")))?;
                folder = Some(text.trim().to_ascii_lowercase());
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
                {
                    if (bytes.len() + chunk.len()) as u64 > max_size {
                        return Err(AppError::Validation(format!(
                            "File exceeds the {max_size} byte upload limit"
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((file_name, bytes));
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let folder = folder.ok_or_else(|| AppError::Validation("Missing 'folder' field".into()))?;
    if !FOLDERS.contains(&folder.as_str()) {
        return Err(AppError::Validation(format!(
            "folder must be one of: {}",
            FOLDERS.join(", ")
        )));
    }
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }
    let extension = allowed_extension(&file_name)?;

    let path = state.files.put(&folder, &extension, &bytes).await?;
    let content_type = mime_guess::from_ext(&extension)
        .first_or_octet_stream()
        .to_string();

    tracing::info!(path = %path, size = bytes.len(), "File uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: path.to_string(),
            size: bytes.len() as u64,
            content_type,
        }),
    ))
}

fn allowed_extension(file_name: &str) -> Result<String, AppError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::Validation(format!(
            "File type not allowed; accepted: {}",
            EXTENSIONS.join(", ")
        )))
    }
}
