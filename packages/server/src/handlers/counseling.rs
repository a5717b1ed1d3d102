use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::CounselingStatus;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use super::fetch_page;
use crate::entity::{counseling_booking, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{ListQuery, Paginated, parse_date, trim_opt};
use crate::models::student::*;
use crate::state::AppState;
use crate::utils::sequence::next_id;

const MANAGE: &str = "counseling:manage";

#[utoipa::path(
    post,
    path = "/api/v1/counseling",
    tag = "Counseling",
    operation_id = "bookCounseling",
    summary = "Request a counseling session",
    description = "Creates a pending booking. Requires `counseling:book` permission.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn create_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("counseling:book")?;

    let preferred_date = parse_date(&payload.preferred_date, "preferred_date")?;
    if preferred_date < Utc::now().date_naive() {
        return Err(AppError::Validation(
            "preferred_date must not be in the past".into(),
        ));
    }

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let model = counseling_booking::ActiveModel {
        id: Set(next_id(&txn, prefix::COUNSELING).await?),
        user_id: Set(auth_user.user_id.clone()),
        topic: Set(payload.topic.trim().to_string()),
        preferred_date: Set(preferred_date),
        notes: Set(trim_opt(payload.notes)),
        status: Set(CounselingStatus::Pending),
        staff_response: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(booking_id = %model.id, "Counseling booked");
    Ok((StatusCode::CREATED, Json(BookingResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/counseling/mine",
    tag = "Counseling",
    operation_id = "listMyBookings",
    summary = "List the caller's counseling bookings",
    params(ListQuery),
    responses(
        (status = 200, description = "Own bookings, newest first", body = Paginated<BookingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user = %auth_user.username))]
pub async fn list_mine(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<BookingResponse>>, AppError> {
    let select = counseling_booking::Entity::find()
        .filter(counseling_booking::Column::UserId.eq(&auth_user.user_id))
        .order_by_desc(counseling_booking::Column::CreatedAt)
        .order_by_desc(counseling_booking::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    Ok(Json(Paginated {
        data: items.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/counseling/{id}",
    tag = "Counseling",
    operation_id = "cancelBooking",
    summary = "Cancel a pending booking",
    description = "Owner only. Returns 409 CONFLICT once staff have acted on the booking.",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking cancelled"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Booking is no longer pending (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn cancel_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = find_booking(&state.db, &id).await?;
    if booking.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    if booking.status != CounselingStatus::Pending {
        return Err(AppError::Conflict(
            "Only pending bookings can be cancelled".into(),
        ));
    }

    // A review may land between the read and the delete.
    let result = counseling_booking::Entity::delete_many()
        .filter(counseling_booking::Column::Id.eq(&booking.id))
        .filter(counseling_booking::Column::Status.eq(CounselingStatus::Pending))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Only pending bookings can be cancelled".into(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/counseling",
    tag = "Counseling",
    operation_id = "listBookings",
    summary = "List counseling bookings",
    description = "Requires `counseling:manage` permission.",
    params(ListQuery, BookingFilter),
    responses(
        (status = 200, description = "Bookings by preferred date", body = Paginated<BookingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, filter))]
pub async fn list_bookings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Paginated<BookingResponse>>, AppError> {
    auth_user.require_permission(MANAGE)?;

    let mut select = counseling_booking::Entity::find();
    if let Some(status) = filter.status {
        select = select.filter(counseling_booking::Column::Status.eq(status));
    }
    let select = select
        .order_by_asc(counseling_booking::Column::PreferredDate)
        .order_by_asc(counseling_booking::Column::Id);
    let (items, pagination) = fetch_page(&state.db, select, query.page_params()).await?;

    let students = load_users(&state.db, items.iter().map(|b| b.user_id.clone())).await?;
    let data = items
        .into_iter()
        .map(|b| {
            let student = students.get(&b.user_id).cloned();
            BookingResponse::with_student(b, student)
        })
        .collect();

    Ok(Json(Paginated { data, pagination }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/counseling/{id}",
    tag = "Counseling",
    operation_id = "reviewBooking",
    summary = "Approve, reject or complete a booking",
    description = "Status moves: pending → approved | rejected, approved → completed. Requires `counseling:manage` permission.",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = ReviewBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Status change not allowed (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn review_booking(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ReviewBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    auth_user.require_permission(MANAGE)?;

    let existing = find_booking(&state.db, &id).await?;
    if payload == ReviewBookingRequest::default() {
        return Ok(Json(existing.into()));
    }

    let current = existing.status;
    let mut active: counseling_booking::ActiveModel = existing.into();
    if let Some(next) = payload.status
        && next != current
    {
        if !current.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Cannot change a {} booking to {}",
                status_name(current),
                status_name(next)
            )));
        }
        active.status = Set(next);
    }
    if let Some(response) = payload.staff_response {
        active.staff_response = Set(trim_opt(response));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    tracing::info!(booking_id = %updated.id, status = status_name(updated.status), "Booking reviewed");
    Ok(Json(updated.into()))
}

fn status_name(status: CounselingStatus) -> &'static str {
    match status {
        CounselingStatus::Pending => "pending",
        CounselingStatus::Approved => "approved",
        CounselingStatus::Rejected => "rejected",
        CounselingStatus::Completed => "completed",
    }
}

/// Load users by id into a map.
pub(crate) async fn load_users(
    db: &DatabaseConnection,
    ids: impl Iterator<Item = String>,
) -> Result<HashMap<String, user::Model>, DbErr> {
    let mut ids: Vec<String> = ids.collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
}

async fn find_booking<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> Result<counseling_booking::Model, AppError> {
    counseling_booking::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))
}
