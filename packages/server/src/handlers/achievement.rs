use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{existing_file, fetch_page, lower_like, remove_replaced, remove_stored};
use crate::entity::achievement;
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
    path = "/api/v1/achievements",
    tag = "Achievements",
    operation_id = "listAchievements",
    summary = "List student achievements",
    params(ListQuery),
    responses(
        (status = 200, description = "Achievements, most recent year first", body = Paginated<AchievementResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AchievementResponse>>, AppError> {
    list(&state, &query).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/achievements",
    tag = "Achievements",
    operation_id = "adminListAchievements",
    summary = "List student achievements",
    description = "Requires `content:manage` permission.",
    params(ListQuery),
    responses(
        (status = 200, description = "Achievements", body = Paginated<AchievementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_achievements(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AchievementResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    list(&state, &query).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/achievements",
    tag = "Achievements",
    operation_id = "createAchievement",
    summary = "Record a student achievement",
    description = "Requires `content:manage` permission.",
    request_body = CreateAchievementRequest,
    responses(
        (status = 201, description = "Achievement created", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAchievementRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let image_path = match trim_opt(payload.image_path) {
        Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
        None => None,
    };

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = achievement::ActiveModel {
        id: Set(next_id(&txn, prefix::ACHIEVEMENT).await?),
        title: Set(payload.title.trim().to_string()),
        student_name: Set(payload.student_name.trim().to_string()),
        level: Set(payload.level.trim().to_lowercase()),
        year: Set(payload.year),
        description: Set(trim_opt(payload.description)),
        image_path: Set(image_path),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/achievements/{id}",
    tag = "Achievements",
    operation_id = "getAchievement",
    summary = "Get an achievement",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Achievement", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AchievementResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_achievement(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/achievements/{id}",
    tag = "Achievements",
    operation_id = "updateAchievement",
    summary = "Update an achievement",
    description = "PATCH semantics. Replacing or clearing the image deletes the previous file. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Achievement ID")),
    request_body = UpdateAchievementRequest,
    responses(
        (status = 200, description = "Achievement updated", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateAchievementRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_achievement(&state.db, &id).await?;
    if payload == UpdateAchievementRequest::default() {
        return Ok(Json(existing.into()));
    }

    let old_image = existing.image_path.clone();
    let mut active: achievement::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(name) = payload.student_name {
        active.student_name = Set(name.trim().to_string());
    }
    if let Some(level) = payload.level {
        active.level = Set(level.trim().to_lowercase());
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(description) = payload.description {
        active.description = Set(trim_opt(description));
    }
    if let Some(image) = payload.image_path {
        active.image_path = Set(match trim_opt(image) {
            Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
            None => None,
        });
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    remove_replaced(&state, old_image.as_deref(), updated.image_path.as_deref()).await;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/achievements/{id}",
    tag = "Achievements",
    operation_id = "deleteAchievement",
    summary = "Delete an achievement",
    description = "Also deletes its image. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Achievement ID")),
    responses(
        (status = 204, description = "Achievement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_achievement(&state.db, &id).await?;
    achievement::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    remove_stored(&state, existing.image_path.as_deref()).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list(
    state: &AppState,
    query: &ListQuery,
) -> Result<Paginated<AchievementResponse>, AppError> {
    let mut select = achievement::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(
            Condition::any()
                .add(lower_like(achievement::Column::Title, &term))
                .add(lower_like(achievement::Column::StudentName, &term)),
        );
    }
    let select = select
        .order_by_desc(achievement::Column::Year)
        .order_by_desc(achievement::Column::CreatedAt);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    })
}

async fn find_achievement<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<achievement::Model, AppError> {
    achievement::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Achievement not found".into()))
}
