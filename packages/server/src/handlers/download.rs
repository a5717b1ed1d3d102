use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use super::{existing_file, fetch_page, lower_like, parse_stored, remove_replaced, remove_stored};
use crate::entity::download;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::*;
use crate::models::shared::{ListQuery, Paginated, trim_opt};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "content:manage";

#[utoipa::path(
    get,
    path = "/api/v1/downloads",
    tag = "Downloads",
    operation_id = "listDownloads",
    summary = "List downloadable documents",
    params(ListQuery),
    responses(
        (status = 200, description = "Documents, newest first", body = Paginated<DownloadResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<DownloadResponse>>, AppError> {
    list(&state, &query).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/downloads/{id}/file",
    tag = "Downloads",
    operation_id = "downloadFile",
    summary = "Download a document",
    description = "Streams the stored file as an attachment named after the document's `file_name`.",
    params(("id" = String, Path, description = "Download ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let model = find_download(&state.db, &id).await?;
    let path = parse_stored(&model.file_path)?;
    let reader = state.files.open(&path).await?;

    let content_type = mime_guess::from_path(&model.file_name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, model.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&model.file_name),
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/downloads",
    tag = "Downloads",
    operation_id = "adminListDownloads",
    summary = "List downloadable documents",
    description = "Requires `content:manage` permission.",
    params(ListQuery),
    responses(
        (status = 200, description = "Documents", body = Paginated<DownloadResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_downloads(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<DownloadResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    list(&state, &query).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/downloads",
    tag = "Downloads",
    operation_id = "createDownload",
    summary = "Publish an uploaded document",
    description = "`file_path` must come from the upload endpoint. The size is read from storage. Requires `content:manage` permission.",
    request_body = CreateDownloadRequest,
    responses(
        (status = 201, description = "Document published", body = DownloadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_download(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDownloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let path = existing_file(&state, &payload.file_path).await?;
    let size = state.files.size(&path).await?;
    let title = payload.title.trim().to_string();
    let file_name =
        trim_opt(payload.file_name).unwrap_or_else(|| default_file_name(&title, &path));

    let txn = state.db.begin().await?;
    let model = download::ActiveModel {
        id: Set(next_id(&txn, prefix::DOWNLOAD).await?),
        title: Set(title),
        description: Set(trim_opt(payload.description)),
        file_path: Set(path.to_string()),
        file_name: Set(file_name),
        size: Set(size as i64),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(DownloadResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/downloads/{id}",
    tag = "Downloads",
    operation_id = "getDownload",
    summary = "Get a document record",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Download ID")),
    responses(
        (status = 200, description = "Document", body = DownloadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_download(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DownloadResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_download(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/downloads/{id}",
    tag = "Downloads",
    operation_id = "updateDownload",
    summary = "Update a document record",
    description = "PATCH semantics. Pointing `file_path` at a new upload deletes the previous file. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Download ID")),
    request_body = UpdateDownloadRequest,
    responses(
        (status = 200, description = "Document updated", body = DownloadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_download(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateDownloadRequest>,
) -> Result<Json<DownloadResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_download(&state.db, &id).await?;
    if payload == UpdateDownloadRequest::default() {
        return Ok(Json(existing.into()));
    }

    let old_path = existing.file_path.clone();
    let mut active: download::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(trim_opt(description));
    }
    if let Some(raw) = payload.file_path {
        let path = existing_file(&state, &raw).await?;
        active.size = Set(state.files.size(&path).await? as i64);
        active.file_path = Set(path.to_string());
    }
    if let Some(name) = payload.file_name {
        active.file_name = Set(name.trim().to_string());
    }

    let updated = active.update(&state.db).await?;
    remove_replaced(&state, Some(&old_path), Some(&updated.file_path)).await;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/downloads/{id}",
    tag = "Downloads",
    operation_id = "deleteDownload",
    summary = "Delete a document",
    description = "Also deletes the stored file. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Download ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_download(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_download(&state.db, &id).await?;
    download::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    remove_stored(&state, Some(&existing.file_path)).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list(state: &AppState, query: &ListQuery) -> Result<Paginated<DownloadResponse>, AppError> {
    let mut select = download::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(download::Column::Title, &term));
    }
    let select = select
        .order_by_desc(download::Column::CreatedAt)
        .order_by_desc(download::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    })
}

async fn find_download<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<download::Model, AppError> {
    download::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Download not found".into()))
}

fn default_file_name(title: &str, path: &common::storage::StoredPath) -> String {
    match path.extension() {
        Some(ext) => format!("{title}.{ext}"),
        None => title.to_string(),
    }
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = match ascii_safe.trim() {
        "" => "download",
        name => name,
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
