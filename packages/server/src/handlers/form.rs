use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::sequence::prefix;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde_json::Value;
use tracing::instrument;

use super::scholarship::find_scholarship;
use super::{fetch_page, lower_like};
use crate::entity::{form_field, form_setting, form_submission, scholarship_form};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::forms::service::{LoadedForm, availability, load_form};
use crate::models::form::*;
use crate::models::shared::{ListQuery, Paginated, trim_opt};
use crate::state::AppState;
use crate::utils::sequence::next_id;

const PERMISSION: &str = "form:manage";

#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}",
    tag = "Forms",
    operation_id = "getForm",
    summary = "Get a form's schema and availability",
    description = "Returns the active fields in display order, the form settings and whether a new submission would currently be accepted (`open`) or the rejection code it would receive.",
    params(("id" = String, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form schema", body = FormDetailResponse),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_public_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FormDetailResponse>, AppError> {
    let loaded = load_form(&state.db, &id).await?;
    if !loaded.form.is_active {
        return Err(AppError::NotFound("Form not found".into()));
    }
    Ok(Json(detail(&state.db, loaded).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/forms",
    tag = "Forms",
    operation_id = "listForms",
    summary = "List forms",
    description = "Requires `form:manage` permission.",
    params(ListQuery, ("scholarship_id" = Option<String>, Query, description = "Only forms of this scholarship")),
    responses(
        (status = 200, description = "Forms", body = Paginated<FormResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, filter))]
pub async fn list_forms(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<FormFilter>,
) -> Result<Json<Paginated<FormResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut select = scholarship_form::Entity::find();
    if let Some(scholarship_id) = filter.scholarship_id {
        select = select.filter(scholarship_form::Column::ScholarshipId.eq(scholarship_id));
    }
    if let Some(term) = query.search_term() {
        select = select.filter(lower_like(scholarship_form::Column::Title, &term));
    }
    let select = select.order_by_desc(scholarship_form::Column::CreatedAt);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[derive(serde::Deserialize)]
pub struct FormFilter {
    pub scholarship_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/forms",
    tag = "Forms",
    operation_id = "createForm",
    summary = "Create a form for a scholarship",
    description = "Creates the form with default settings (accepting responses, no window, no quota, edits disabled). Requires `form:manage` permission.",
    request_body = CreateFormRequest,
    responses(
        (status = 201, description = "Form created", body = FormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scholarship not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFormRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let scholarship = find_scholarship(&txn, payload.scholarship_id.trim()).await?;

    let now = Utc::now();
    let form = scholarship_form::ActiveModel {
        id: Set(next_id(&txn, prefix::FORM).await?),
        scholarship_id: Set(scholarship.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(trim_opt(payload.description)),
        is_active: Set(payload.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    form_setting::ActiveModel {
        form_id: Set(form.id.clone()),
        accept_responses: Set(true),
        one_submission_per_email: Set(false),
        allow_edit: Set(false),
        submission_start: Set(None),
        submission_deadline: Set(None),
        max_submissions: Set(None),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(form_id = %form.id, user = %auth_user.username, "Form created");

    Ok((StatusCode::CREATED, Json(FormResponse::from(form))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/forms/{id}",
    tag = "Forms",
    operation_id = "adminGetForm",
    summary = "Get a form with settings and all fields",
    description = "Unlike the public view this includes inactive fields. Requires `form:manage` permission.",
    params(("id" = String, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form", body = FormDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FormDetailResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let mut loaded = load_form(&state.db, &id).await?;
    loaded.fields = all_fields(&state.db, &id).await?;
    Ok(Json(detail(&state.db, loaded).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/forms/{id}",
    tag = "Forms",
    operation_id = "updateForm",
    summary = "Update a form",
    description = "PATCH semantics. Requires `form:manage` permission.",
    params(("id" = String, Path, description = "Form ID")),
    request_body = UpdateFormRequest,
    responses(
        (status = 200, description = "Form updated", body = FormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateFormRequest>,
) -> Result<Json<FormResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let existing = find_form(&state.db, &id).await?;
    if payload == UpdateFormRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: scholarship_form::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(trim_opt(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/forms/{id}",
    tag = "Forms",
    operation_id = "deleteForm",
    summary = "Delete a form",
    description = "Deletes the form with its fields and settings. Requires `form:manage` permission. Returns 409 CONFLICT if the form has submissions.",
    params(("id" = String, Path, description = "Form ID")),
    responses(
        (status = 204, description = "Form deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Form has submissions (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    find_form(&txn, &id).await?;

    let submissions = form_submission::Entity::find()
        .filter(form_submission::Column::FormId.eq(&id))
        .count(&txn)
        .await?;
    if submissions > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a form that has submissions; deactivate it instead".into(),
        ));
    }

    form_field::Entity::delete_many()
        .filter(form_field::Column::FormId.eq(&id))
        .exec(&txn)
        .await?;
    form_setting::Entity::delete_by_id(id.clone())
        .exec(&txn)
        .await?;
    scholarship_form::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/forms/{id}/fields",
    tag = "Forms",
    operation_id = "replaceFormFields",
    summary = "Replace a form's field schema",
    description = "Replaces every field of the form. Fields whose key already exists keep their ID. Existing submissions keep their stored data. Requires `form:manage` permission.",
    params(("id" = String, Path, description = "Form ID")),
    request_body = ReplaceFieldsRequest,
    responses(
        (status = 200, description = "New schema", body = Vec<FieldResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(count = payload.fields.len()))]
pub async fn replace_fields(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ReplaceFieldsRequest>,
) -> Result<Json<Vec<FieldResponse>>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let txn = state.db.begin().await?;
    let form = find_form(&txn, &id).await?;

    let existing = all_fields(&txn, &id).await?;
    form_field::Entity::delete_many()
        .filter(form_field::Column::FormId.eq(&id))
        .exec(&txn)
        .await?;

    let mut next_index = std::collections::HashMap::<i32, i32>::new();
    for input in payload.fields {
        let field_index = next_index.entry(input.section_index).or_insert(0);
        let id = match existing.iter().find(|f| f.key == input.key) {
            Some(previous) => previous.id.clone(),
            None => next_id(&txn, prefix::FORM_FIELD).await?,
        };
        let options: Vec<Value> = input
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(|o| Value::String(o.to_string()))
            .collect();

        form_field::ActiveModel {
            id: Set(id),
            form_id: Set(form.id.clone()),
            section_index: Set(input.section_index),
            section_title: Set(trim_opt(input.section_title)),
            field_index: Set(*field_index),
            key: Set(input.key),
            label: Set(input.label.trim().to_string()),
            field_type: Set(input.field_type),
            options: Set(Value::Array(options)),
            required: Set(input.required),
            is_active: Set(input.is_active),
        }
        .insert(&txn)
        .await?;
        *field_index += 1;
    }

    let mut active: scholarship_form::ActiveModel = form.into();
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    let fields = all_fields(&txn, &id).await?;
    txn.commit().await?;

    tracing::info!(form_id = %id, fields = fields.len(), "Form schema replaced");
    Ok(Json(fields.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/forms/{id}/settings",
    tag = "Forms",
    operation_id = "updateFormSettings",
    summary = "Replace a form's submission settings",
    description = "Requires `form:manage` permission.",
    params(("id" = String, Path, description = "Form ID")),
    request_body = FormSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = FormSettingsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<FormSettingsRequest>,
) -> Result<Json<FormSettingsResponse>, AppError> {
    auth_user.require_permission(PERMISSION)?;

    let form = find_form(&state.db, &id).await?;
    let model = form_setting::ActiveModel {
        form_id: Set(form.id.clone()),
        accept_responses: Set(payload.accept_responses),
        one_submission_per_email: Set(payload.one_submission_per_email),
        allow_edit: Set(payload.allow_edit),
        submission_start: Set(payload.submission_start),
        submission_deadline: Set(payload.submission_deadline),
        max_submissions: Set(payload.max_submissions),
        updated_at: Set(Utc::now()),
    };

    form_setting::Entity::insert(model)
        .on_conflict(
            OnConflict::column(form_setting::Column::FormId)
                .update_columns([
                    form_setting::Column::AcceptResponses,
                    form_setting::Column::OneSubmissionPerEmail,
                    form_setting::Column::AllowEdit,
                    form_setting::Column::SubmissionStart,
                    form_setting::Column::SubmissionDeadline,
                    form_setting::Column::MaxSubmissions,
                    form_setting::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = form_setting::Entity::find_by_id(form.id).one(&state.db).await?;
    Ok(Json(saved.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/forms/{id}/submissions",
    tag = "Forms",
    operation_id = "listFormSubmissions",
    summary = "List the submissions to a form",
    description = "Requires `submission:view_all` permission.",
    params(("id" = String, Path, description = "Form ID"), ListQuery),
    responses(
        (status = 200, description = "Submissions, oldest first", body = Paginated<SubmissionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<SubmissionResponse>>, AppError> {
    auth_user.require_permission("submission:view_all")?;
    find_form(&state.db, &id).await?;

    let select = form_submission::Entity::find()
        .filter(form_submission::Column::FormId.eq(&id))
        .order_by_asc(form_submission::Column::CreatedAt)
        .order_by_asc(form_submission::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

async fn detail(
    db: &DatabaseConnection,
    loaded: LoadedForm,
) -> Result<FormDetailResponse, AppError> {
    let availability = availability(db, &loaded, None).await?.to_string();
    Ok(FormDetailResponse {
        form: loaded.form.into(),
        settings: loaded.setting.into(),
        fields: loaded.fields.into_iter().map(Into::into).collect(),
        availability,
    })
}

async fn all_fields<C: ConnectionTrait>(
    conn: &C,
    form_id: &str,
) -> Result<Vec<form_field::Model>, DbErr> {
    form_field::Entity::find()
        .filter(form_field::Column::FormId.eq(form_id))
        .order_by_asc(form_field::Column::SectionIndex)
        .order_by_asc(form_field::Column::FieldIndex)
        .all(conn)
        .await
}

async fn find_form<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<scholarship_form::Model, AppError> {
    scholarship_form::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".into()))
}
