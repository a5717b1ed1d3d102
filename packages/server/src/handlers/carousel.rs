use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{existing_file, fetch_page, lower_like, remove_replaced, remove_stored};
use crate::entity::carousel_slide;
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
    path = "/api/v1/carousel",
    tag = "Carousel",
    operation_id = "listCarousel",
    summary = "List active carousel slides in display order",
    responses(
        (status = 200, description = "Active slides", body = Vec<SlideResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<SlideResponse>>, AppError> {
    let slides = carousel_slide::Entity::find()
        .filter(carousel_slide::Column::IsActive.eq(true))
        .order_by_asc(carousel_slide::Column::Position)
        .order_by_asc(carousel_slide::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(slides.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/carousel",
    tag = "Carousel",
    operation_id = "adminListCarousel",
    summary = "List all carousel slides",
    description = "Requires `content:manage` permission.",
    params(ListQuery),
    responses(
        (status = 200, description = "Slides in display order", body = Paginated<SlideResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_slides(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SlideResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut select = carousel_slide::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(carousel_slide::Column::Title, &term));
    }
    let select = select
        .order_by_asc(carousel_slide::Column::Position)
        .order_by_asc(carousel_slide::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/carousel",
    tag = "Carousel",
    operation_id = "createSlide",
    summary = "Add a carousel slide",
    description = "Requires `content:manage` permission.",
    request_body = CreateSlideRequest,
    responses(
        (status = 201, description = "Slide created", body = SlideResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_slide(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSlideRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let image_path = existing_file(&state, &payload.image_path).await?;

    let txn = state.db.begin().await?;
    let position = match payload.position {
        Some(p) => p,
        None => next_position(&txn).await?,
    };
    let model = carousel_slide::ActiveModel {
        id: Set(next_id(&txn, prefix::CAROUSEL_SLIDE).await?),
        title: Set(payload.title.trim().to_string()),
        image_path: Set(image_path.to_string()),
        link_url: Set(trim_opt(payload.link_url)),
        position: Set(position),
        is_active: Set(payload.is_active),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(SlideResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/carousel/{id}",
    tag = "Carousel",
    operation_id = "getSlide",
    summary = "Get a carousel slide",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Slide ID")),
    responses(
        (status = 200, description = "Slide", body = SlideResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_slide(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SlideResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_slide(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/carousel/{id}",
    tag = "Carousel",
    operation_id = "updateSlide",
    summary = "Update a carousel slide",
    description = "PATCH semantics. A new image deletes the previous one. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Slide ID")),
    request_body = UpdateSlideRequest,
    responses(
        (status = 200, description = "Slide updated", body = SlideResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_slide(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateSlideRequest>,
) -> Result<Json<SlideResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_slide(&state.db, &id).await?;
    if payload == UpdateSlideRequest::default() {
        return Ok(Json(existing.into()));
    }

    let old_image = existing.image_path.clone();
    let mut active: carousel_slide::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(raw) = payload.image_path {
        active.image_path = Set(existing_file(&state, &raw).await?.to_string());
    }
    if let Some(link) = payload.link_url {
        active.link_url = Set(trim_opt(link));
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    remove_replaced(&state, Some(&old_image), Some(&updated.image_path)).await;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/carousel/{id}",
    tag = "Carousel",
    operation_id = "deleteSlide",
    summary = "Delete a carousel slide",
    description = "Also deletes its image. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Slide ID")),
    responses(
        (status = 204, description = "Slide deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_slide(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_slide(&state.db, &id).await?;
    carousel_slide::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    remove_stored(&state, Some(&existing.image_path)).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn next_position<C: ConnectionTrait>(conn: &C) -> Result<i32, DbErr> {
    let max_pos: Option<i32> = carousel_slide::Entity::find()
        .select_only()
        .column_as(carousel_slide::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();
    Ok(max_pos.unwrap_or(-1) + 1)
}

async fn find_slide<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<carousel_slide::Model, AppError> {
    carousel_slide::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Carousel slide not found".into()))
}
