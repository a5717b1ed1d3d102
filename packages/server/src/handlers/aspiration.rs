use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::AspirationStatus;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::counseling::load_users;
use super::{fetch_page, lower_like};
use crate::entity::{aspiration, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{ListQuery, Paginated, trim_opt};
use crate::models::student::*;
use crate::state::AppState;
use crate::utils::sequence::next_id;

const MANAGE: &str = "aspiration:manage";

#[utoipa::path(
    post,
    path = "/api/v1/aspirations",
    tag = "Aspirations",
    operation_id = "submitAspiration",
    summary = "Submit an aspiration",
    description = "Anonymous aspirations are shown to staff without the submitter. Requires `aspiration:submit` permission.",
    request_body = CreateAspirationRequest,
    responses(
        (status = 201, description = "Aspiration submitted", body = AspirationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn create_aspiration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAspirationRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("aspiration:submit")?;

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = aspiration::ActiveModel {
        id: Set(next_id(&txn, prefix::ASPIRATION).await?),
        user_id: Set(auth_user.user_id.clone()),
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content.trim().to_string()),
        category: Set(trim_opt(payload.category).map(|c| c.to_lowercase())),
        is_anonymous: Set(payload.is_anonymous),
        status: Set(AspirationStatus::Submitted),
        response: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(AspirationResponse::own(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/aspirations/mine",
    tag = "Aspirations",
    operation_id = "listMyAspirations",
    summary = "List the caller's aspirations",
    params(ListQuery),
    responses(
        (status = 200, description = "Own aspirations, newest first", body = Paginated<AspirationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user = %auth_user.username))]
pub async fn list_mine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AspirationResponse>>, AppError> {
    let select = aspiration::Entity::find()
        .filter(aspiration::Column::UserId.eq(&auth_user.user_id))
        .order_by_desc(aspiration::Column::CreatedAt)
        .order_by_desc(aspiration::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(AspirationResponse::own).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/aspirations",
    tag = "Aspirations",
    operation_id = "listAspirations",
    summary = "List aspirations",
    description = "Anonymous aspirations carry no `user_id` or `submitter_name`. Requires `aspiration:manage` permission.",
    params(ListQuery, AspirationFilter),
    responses(
        (status = 200, description = "Aspirations, newest first", body = Paginated<AspirationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, filter))]
pub async fn list_aspirations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<AspirationFilter>,
) -> Result<Json<Paginated<AspirationResponse>>, AppError> {
    auth_user.require_permission(MANAGE)?;

    let mut select = aspiration::Entity::find();
    if let Some(status) = filter.status {
        select = select.filter(aspiration::Column::Status.eq(status));
    }
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(aspiration::Column::Title, &term));
    }
    let select = select
        .order_by_desc(aspiration::Column::CreatedAt)
        .order_by_desc(aspiration::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    let submitters = load_users(
        &state.db,
        items
            .iter()
            .filter(|a| !a.is_anonymous)
            .map(|a| a.user_id.clone()),
    )
    .await?;
    let data = items
        .into_iter()
        .map(|a| {
            let submitter: Option<user::Model> = submitters.get(&a.user_id).cloned();
            AspirationResponse::for_staff(a, submitter)
        })
        .collect();

    Ok(Json(Paginated { data, pagination }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/aspirations/{id}",
    tag = "Aspirations",
    operation_id = "respondToAspiration",
    summary = "Respond to an aspiration",
    description = "Sets the status and/or the response. Setting a response without a status marks the aspiration `responded`. Requires `aspiration:manage` permission.",
    params(("id" = String, Path, description = "Aspiration ID")),
    request_body = RespondAspirationRequest,
    responses(
        (status = 200, description = "Aspiration updated", body = AspirationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn respond(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RespondAspirationRequest>,
) -> Result<Json<AspirationResponse>, AppError> {
    auth_user.require_permission(MANAGE)?;

    let existing = aspiration::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Aspiration not found".into()))?;
    if payload == RespondAspirationRequest::default() {
        return Ok(Json(staff_view(&state.db, existing).await?));
    }

    let mut active: aspiration::ActiveModel = existing.into();
    let mut status = payload.status;
    if let Some(response) = payload.response {
        let response = trim_opt(response);
        if response.is_some() && status.is_none() {
            status = Some(AspirationStatus::Responded);
        }
        active.response = Set(response);
    }
    if let Some(status) = status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    tracing::info!(aspiration_id = %updated.id, "Aspiration updated");
    Ok(Json(staff_view(&state.db, updated).await?))
}

async fn staff_view(
    db: &DatabaseConnection,
    model: aspiration::Model,
) -> Result<AspirationResponse, DbErr> {
    let submitter = if model.is_anonymous {
        None
    } else {
        user::Entity::find_by_id(model.user_id.clone()).one(db).await?
    };
    Ok(AspirationResponse::for_staff(model, submitter))
}
