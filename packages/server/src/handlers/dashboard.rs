use axum::Json;
use axum::extract::State;
use chrono::{Duration, Utc};
use common::{AspirationStatus, CounselingStatus};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{aspiration, counseling_booking, form_submission, scholarship_form};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::dashboard::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    operation_id = "getDashboard",
    summary = "Summary counts for the caller",
    description = "Staff groups appear per permission: `counseling:manage`, `aspiration:manage`, \
                   `submission:view_all` and `form:manage`. Callers who can submit, book or \
                   send aspirations also get counts over their own records.",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn get_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let staff = staff_summary(&state.db, &auth_user).await?;
    let is_student = ["submission:submit", "counseling:book", "aspiration:submit"]
        .iter()
        .any(|p| auth_user.has_permission(p));
    let student = if is_student {
        Some(student_summary(&state.db, &auth_user.user_id).await?)
    } else {
        None
    };

    Ok(Json(DashboardResponse {
        role: auth_user.role,
        staff: (!staff.is_empty()).then_some(staff),
        student,
    }))
}

async fn staff_summary(db: &DatabaseConnection, user: &AuthUser) -> Result<StaffSummary, DbErr> {
    let mut summary = StaffSummary::default();

    if user.has_permission("counseling:manage") {
        summary.pending_counseling = Some(
            counseling_booking::Entity::find()
                .filter(counseling_booking::Column::Status.eq(CounselingStatus::Pending))
                .count(db)
                .await?,
        );
    }
    if user.has_permission("aspiration:manage") {
        summary.open_aspirations = Some(
            aspiration::Entity::find()
                .filter(aspiration::Column::Status.ne(AspirationStatus::Responded))
                .count(db)
                .await?,
        );
    }
    if user.has_permission("submission:view_all") {
        let since = Utc::now() - Duration::days(7);
        summary.submissions_this_week = Some(
            form_submission::Entity::find()
                .filter(form_submission::Column::CreatedAt.gte(since))
                .count(db)
                .await?,
        );
    }
    if user.has_permission("form:manage") {
        summary.active_forms = Some(
            scholarship_form::Entity::find()
                .filter(scholarship_form::Column::IsActive.eq(true))
                .count(db)
                .await?,
        );
    }

    Ok(summary)
}

async fn student_summary(db: &DatabaseConnection, user_id: &str) -> Result<StudentSummary, DbErr> {
    let submissions = form_submission::Entity::find()
        .filter(form_submission::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    let counseling_bookings = counseling_booking::Entity::find()
        .filter(counseling_booking::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    let pending_counseling = counseling_booking::Entity::find()
        .filter(counseling_booking::Column::UserId.eq(user_id))
        .filter(counseling_booking::Column::Status.eq(CounselingStatus::Pending))
        .count(db)
        .await?;
    let aspirations = aspiration::Entity::find()
        .filter(aspiration::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    Ok(StudentSummary {
        submissions,
        counseling_bookings,
        pending_counseling,
        aspirations,
    })
}
