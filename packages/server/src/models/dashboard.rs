use serde::Serialize;

/// Counts for the staff side of the portal. Each group is present only when
/// the caller holds the permission that governs it.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct StaffSummary {
    /// Counseling bookings awaiting review.
    pub pending_counseling: Option<u64>,
    /// Aspirations not yet responded to.
    pub open_aspirations: Option<u64>,
    /// Submissions received in the last 7 days.
    pub submissions_this_week: Option<u64>,
    pub active_forms: Option<u64>,
}

impl StaffSummary {
    pub fn is_empty(&self) -> bool {
        self.pending_counseling.is_none()
            && self.open_aspirations.is_none()
            && self.submissions_this_week.is_none()
            && self.active_forms.is_none()
    }
}

/// Counts over the caller's own records.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StudentSummary {
    pub submissions: u64,
    pub counseling_bookings: u64,
    pub pending_counseling: u64,
    pub aspirations: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    #[schema(example = "student")]
    pub role: String,
    pub staff: Option<StaffSummary>,
    pub student: Option<StudentSummary>,
}
