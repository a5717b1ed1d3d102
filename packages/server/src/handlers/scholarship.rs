use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::{fetch_page, lower_like};
use crate::entity::{scholarship, scholarship_form};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::form::*;
use crate::models::shared::{ListQuery, Paginated, trim_opt};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "scholarship:manage";

#[utoipa::path(
    get,
    path = "/api/v1/scholarships",
    tag = "Scholarships",
    operation_id = "listScholarships",
    summary = "List active scholarships",
    params(ListQuery),
    responses(
        (status = 200, description = "Active scholarships, newest first", body = Paginated<ScholarshipResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<ScholarshipResponse>>, AppError> {
    let mut select = scholarship::Entity::find().filter(scholarship::Column::IsActive.eq(true));
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(scholarship::Column::Title, &term));
    }
    let select = select.order_by_desc(scholarship::Column::CreatedAt);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/scholarships/{id}",
    tag = "Scholarships",
    operation_id = "getScholarship",
    summary = "Get an active scholarship with its active forms",
    params(("id" = String, Path, description = "Scholarship ID")),
    responses(
        (status = 200, description = "Scholarship details", body = ScholarshipDetailResponse),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScholarshipDetailResponse>, AppError> {
    let model = find_scholarship(&state.db, &id).await?;
    if !model.is_active {
        return Err(AppError::NotFound("Scholarship not found".into()));
    }

    let forms = scholarship_form::Entity::find()
        .filter(scholarship_form::Column::ScholarshipId.eq(&model.id))
        .filter(scholarship_form::Column::IsActive.eq(true))
        .order_by_asc(scholarship_form::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(ScholarshipDetailResponse {
        scholarship: model.into(),
        forms: forms.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/scholarships",
    tag = "Scholarships",
    operation_id = "adminListScholarships",
    summary = "List all scholarships",
    description = "Requires `scholarship:manage` permission. Includes inactive scholarships.",
    params(ListQuery),
    responses(
        (status = 200, description = "Scholarships", body = Paginated<ScholarshipResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_scholarships(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<ScholarshipResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut select = scholarship::Entity::find();
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(scholarship::Column::Title, &term));
    }
    let select = select.order_by_desc(scholarship::Column::CreatedAt);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/scholarships",
    tag = "Scholarships",
    operation_id = "createScholarship",
    summary = "Create a scholarship",
    description = "Requires `scholarship:manage` permission.",
    request_body = CreateScholarshipRequest,
    responses(
        (status = 201, description = "Scholarship created", body = ScholarshipResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_scholarship(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScholarshipRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = scholarship::ActiveModel {
        id: Set(next_id(&txn, prefix::SCHOLARSHIP).await?),
        title: Set(payload.title.trim().to_string()),
        provider: Set(trim_opt(payload.provider)),
        description: Set(payload.description),
        requirements: Set(trim_opt(payload.requirements)),
        is_active: Set(payload.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(ScholarshipResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/scholarships/{id}",
    tag = "Scholarships",
    operation_id = "adminGetScholarship",
    summary = "Get a scholarship",
    description = "Requires `scholarship:manage` permission.",
    params(("id" = String, Path, description = "Scholarship ID")),
    responses(
        (status = 200, description = "Scholarship", body = ScholarshipResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_scholarship(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScholarshipResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;
    Ok(Json(find_scholarship(&state.db, &id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/scholarships/{id}",
    tag = "Scholarships",
    operation_id = "updateScholarship",
    summary = "Update a scholarship",
    description = "PATCH semantics: absent fields are left unchanged. Requires `scholarship:manage` permission.",
    params(("id" = String, Path, description = "Scholarship ID")),
    request_body = UpdateScholarshipRequest,
    responses(
        (status = 200, description = "Scholarship updated", body = ScholarshipResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_scholarship(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateScholarshipRequest>,
) -> Result<Json<ScholarshipResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_scholarship(&state.db, &id).await?;
    if payload == UpdateScholarshipRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: scholarship::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(provider) = payload.provider {
        active.provider = Set(trim_opt(provider));
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(requirements) = payload.requirements {
        active.requirements = Set(trim_opt(requirements));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/scholarships/{id}",
    tag = "Scholarships",
    operation_id = "deleteScholarship",
    summary = "Delete a scholarship",
    description = "Requires `scholarship:manage` permission. Returns 409 CONFLICT while the scholarship still has forms.",
    params(("id" = String, Path, description = "Scholarship ID")),
    responses(
        (status = 204, description = "Scholarship deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Scholarship has forms (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_scholarship(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    find_scholarship(&txn, &id).await?;

    let form_count = scholarship_form::Entity::find()
        .filter(scholarship_form::Column::ScholarshipId.eq(&id))
        .count(&txn)
        .await?;
    if form_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a scholarship that still has forms".into(),
        ));
    }

    scholarship::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_scholarship<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<scholarship::Model, AppError> {
    scholarship::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Scholarship not found".into()))
}
