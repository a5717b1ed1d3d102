use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{fetch_page, lower_like, publish_stamp};
use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::*;
use crate::models::shared::{ListQuery, Paginated};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "content:manage";

#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List published announcements",
    params(ListQuery),
    responses(
        (status = 200, description = "Published announcements, newest first", body = Paginated<AnnouncementResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AnnouncementResponse>>, AppError> {
    let select = searched(&query)
        .filter(announcement::Column::IsPublished.eq(true))
        .order_by_desc(announcement::Column::PublishedAt)
        .order_by_desc(announcement::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements/{id}",
    tag = "Announcements",
    operation_id = "getAnnouncement",
    summary = "Get a published announcement",
    params(("id" = String, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement", body = AnnouncementResponse),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    let model = find_announcement(&state.db, &id).await?;
    if !model.is_published {
        return Err(AppError::NotFound("Announcement not found".into()));
    }
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/announcements",
    tag = "Announcements",
    operation_id = "adminListAnnouncements",
    summary = "List all announcements, including drafts",
    description = "Requires `content:manage` permission.",
    params(ListQuery),
    responses(
        (status = 200, description = "Announcements", body = Paginated<AnnouncementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_announcements(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AnnouncementResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let select = searched(&query)
        .order_by_desc(announcement::Column::CreatedAt)
        .order_by_desc(announcement::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/announcements",
    tag = "Announcements",
    operation_id = "createAnnouncement",
    summary = "Create an announcement",
    description = "Requires `content:manage` permission.",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement created", body = AnnouncementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = announcement::ActiveModel {
        id: Set(next_id(&txn, prefix::ANNOUNCEMENT).await?),
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content),
        is_published: Set(payload.is_published),
        published_at: Set(publish_stamp(payload.is_published, None)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/announcements/{id}",
    tag = "Announcements",
    operation_id = "adminGetAnnouncement",
    summary = "Get an announcement",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement", body = AnnouncementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_announcement(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/announcements/{id}",
    tag = "Announcements",
    operation_id = "updateAnnouncement",
    summary = "Update an announcement",
    description = "PATCH semantics. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Announcement ID")),
    request_body = UpdateAnnouncementRequest,
    responses(
        (status = 200, description = "Announcement updated", body = AnnouncementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateAnnouncementRequest>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_announcement(&state.db, &id).await?;
    if payload == UpdateAnnouncementRequest::default() {
        return Ok(Json(existing.into()));
    }

    let published_at = existing.published_at;
    let mut active: announcement::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
        active.published_at = Set(publish_stamp(is_published, published_at));
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/announcements/{id}",
    tag = "Announcements",
    operation_id = "deleteAnnouncement",
    summary = "Delete an announcement",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let result = announcement::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Announcement not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn searched(query: &ListQuery) -> Select<announcement::Entity> {
    let mut select = announcement::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(announcement::Column::Title, &term));
    }
    select
}

async fn find_announcement<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<announcement::Model, AppError> {
    announcement::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
}
