use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{existing_file, remove_replaced, remove_stored};
use crate::entity::director;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::*;
use crate::models::shared::trim_opt;
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "content:manage";

#[utoipa::path(
    get,
    path = "/api/v1/directors",
    tag = "Directors",
    operation_id = "listDirectors",
    summary = "List directors in display order",
    responses(
        (status = 200, description = "Directors", body = Vec<DirectorResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<DirectorResponse>>, AppError> {
    Ok(Json(all_directors(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/directors",
    tag = "Directors",
    operation_id = "adminListDirectors",
    summary = "List directors in display order",
    description = "Requires `content:manage` permission.",
    responses(
        (status = 200, description = "Directors", body = Vec<DirectorResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_directors(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DirectorResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(all_directors(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/directors",
    tag = "Directors",
    operation_id = "createDirector",
    summary = "Add a director",
    description = "Requires `content:manage` permission.",
    request_body = CreateDirectorRequest,
    responses(
        (status = 201, description = "Director created", body = DirectorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDirectorRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let photo_path = match trim_opt(payload.photo_path) {
        Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
        None => None,
    };

    let txn = state.db.begin().await?;
    let position = match payload.position {
        Some(p) => p,
        None => next_position(&txn).await?,
    };
    let model = director::ActiveModel {
        id: Set(next_id(&txn, prefix::DIRECTOR).await?),
        name: Set(payload.name.trim().to_string()),
        position_title: Set(payload.position_title.trim().to_string()),
        period: Set(trim_opt(payload.period)),
        photo_path: Set(photo_path),
        position: Set(position),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(DirectorResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/directors/{id}",
    tag = "Directors",
    operation_id = "getDirector",
    summary = "Get a director",
    description = "Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Director ID")),
    responses(
        (status = 200, description = "Director", body = DirectorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DirectorResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_director(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/directors/{id}",
    tag = "Directors",
    operation_id = "updateDirector",
    summary = "Update a director",
    description = "PATCH semantics. Replacing or clearing the photo deletes the previous file. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Director ID")),
    request_body = UpdateDirectorRequest,
    responses(
        (status = 200, description = "Director updated", body = DirectorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateDirectorRequest>,
) -> Result<Json<DirectorResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_director(&state.db, &id).await?;
    if payload == UpdateDirectorRequest::default() {
        return Ok(Json(existing.into()));
    }

    let old_photo = existing.photo_path.clone();
    let mut active: director::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(title) = payload.position_title {
        active.position_title = Set(title.trim().to_string());
    }
    if let Some(period) = payload.period {
        active.period = Set(trim_opt(period));
    }
    if let Some(photo) = payload.photo_path {
        active.photo_path = Set(match trim_opt(photo) {
            Some(raw) => Some(existing_file(&state, &raw).await?.to_string()),
            None => None,
        });
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }

    let updated = active.update(&state.db).await?;
    remove_replaced(&state, old_photo.as_deref(), updated.photo_path.as_deref()).await;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/directors/{id}",
    tag = "Directors",
    operation_id = "deleteDirector",
    summary = "Delete a director",
    description = "Also deletes the photo. Requires `content:manage` permission.",
    params(("id" = String, Path, description = "Director ID")),
    responses(
        (status = 204, description = "Director deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_director(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_director(&state.db, &id).await?;
    director::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;
    remove_stored(&state, existing.photo_path.as_deref()).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn all_directors(db: &DatabaseConnection) -> Result<Vec<DirectorResponse>, DbErr> {
    let directors = director::Entity::find()
        .order_by_asc(director::Column::Position)
        .order_by_asc(director::Column::Id)
        .all(db)
        .await?;
    Ok(directors.into_iter().map(Into::into).collect())
}

async fn next_position<C: ConnectionTrait>(conn: &C) -> Result<i32, DbErr> {
    let max_pos: Option<i32> = director::Entity::find()
        .select_only()
        .column_as(director::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();
    Ok(max_pos.unwrap_or(-1) + 1)
}

async fn find_director<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<director::Model, AppError> {
    director::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Director not found".into()))
}
