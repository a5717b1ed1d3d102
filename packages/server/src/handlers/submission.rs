use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use super::fetch_page;
use crate::entity::form_submission;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::forms::SubmissionPayload;
use crate::forms::service;
use crate::models::form::{SubmissionCreatedResponse, SubmissionResponse};
use crate::models::shared::{ListQuery, Paginated};
use crate::state::AppState;

const SUBMIT_PERMISSION: &str = "submission:submit";

/// Body limit for multipart submission routes (16MB across all parts).
pub fn submission_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/api/v1/forms/submit",
    tag = "Submissions",
    operation_id = "submitForm",
    summary = "Submit a scholarship form",
    description = "`multipart/form-data` with a `form_id` part and one part per field key. File fields accept PDF, JPEG or PNG up to 2MB. Requires `submission:submit` permission.\n\nRejections are returned as 422 with a specific code, checked in this order: `FORM_INACTIVE`, `RESPONSES_CLOSED`, `NOT_YET_OPEN`, `DEADLINE_PASSED`, `QUOTA_REACHED`, `ALREADY_SUBMITTED`, then per-field codes such as `FIELD_REQUIRED`, `INVALID_OPTION`, `FILE_TOO_LARGE` and `INVALID_FILE_TYPE`.",
    request_body(content_type = "multipart/form-data", description = "`form_id` plus one part per field key"),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionCreatedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Form not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Rejected (VALIDATION_ERROR or a rejection code)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.username))]
pub async fn submit_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SUBMIT_PERMISSION)?;

    let payload = SubmissionPayload::from_multipart(multipart).await?;
    let model = service::create_submission(&state, &auth_user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreatedResponse {
            id: model.id,
            created_at: model.created_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/submissions/mine",
    tag = "Submissions",
    operation_id = "listMySubmissions",
    summary = "List the caller's submissions",
    params(ListQuery),
    responses(
        (status = 200, description = "Own submissions, newest first", body = Paginated<SubmissionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user = %auth_user.username))]
pub async fn list_mine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SubmissionResponse>>, AppError> {
    let select = form_submission::Entity::find()
        .filter(form_submission::Column::UserId.eq(&auth_user.user_id))
        .order_by_desc(form_submission::Column::CreatedAt)
        .order_by_desc(form_submission::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get a submission",
    description = "Visible to its owner and to holders of `submission:view_all`.",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let model = form_submission::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    if model.user_id != auth_user.user_id && !auth_user.has_permission("submission:view_all") {
        return Err(AppError::PermissionDenied);
    }
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/submissions/{id}",
    tag = "Submissions",
    operation_id = "updateSubmission",
    summary = "Edit a submission",
    description = "Owner only, and only while the form allows edits and its deadline has not passed. Same multipart layout as submitting; a file field without a new upload keeps its stored file.",
    params(("id" = String, Path, description = "Submission ID")),
    request_body(content_type = "multipart/form-data", description = "One part per field key"),
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Rejected (EDIT_NOT_ALLOWED, DEADLINE_PASSED or a field rejection)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.username))]
pub async fn update_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SubmissionResponse>, AppError> {
    let payload = SubmissionPayload::from_multipart(multipart).await?;
    let model = service::update_submission(&state, &auth_user, &id, payload).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/submissions/{id}",
    tag = "Submissions",
    operation_id = "deleteSubmission",
    summary = "Delete a submission",
    description = "Owner only. Uploaded files are removed from storage.",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 204, description = "Submission deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service::delete_submission(&state, &auth_user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
