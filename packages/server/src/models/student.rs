use chrono::{DateTime, NaiveDate, Utc};
use common::{AspirationStatus, CounselingStatus};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, double_option, parse_date, validate_required_text, validate_title};
use crate::entity::{aspiration, counseling_booking, user};
use crate::error::AppError;

// --- Counseling ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBookingRequest {
    #[schema(example = "Academic stress")]
    pub topic: String,
    /// `YYYY-MM-DD`, today or later.
    #[schema(example = "2025-03-14")]
    pub preferred_date: String,
    pub notes: Option<String>,
}

impl Validate for CreateBookingRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.topic, "Topic", 256)?;
        parse_date(&self.preferred_date, "preferred_date")?;
        if let Some(notes) = &self.notes
            && notes.chars().count() > 5_000
        {
            return Err(AppError::Validation(
                "Notes must be at most 5000 characters".into(),
            ));
        }
        Ok(())
    }
}

/// Staff review of a booking.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct ReviewBookingRequest {
    /// Allowed moves: pending → approved | rejected, approved → completed.
    pub status: Option<CounselingStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub staff_response: Option<Option<String>>,
}

impl Validate for ReviewBookingRequest {}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    pub status: Option<CounselingStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    #[schema(example = "csl001")]
    pub id: String,
    pub user_id: String,
    /// Filled in staff listings.
    pub student_name: Option<String>,
    pub topic: String,
    pub preferred_date: NaiveDate,
    pub notes: Option<String>,
    pub status: CounselingStatus,
    pub staff_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<counseling_booking::Model> for BookingResponse {
    fn from(m: counseling_booking::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            student_name: None,
            topic: m.topic,
            preferred_date: m.preferred_date,
            notes: m.notes,
            status: m.status,
            staff_response: m.staff_response,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl BookingResponse {
    pub fn with_student(m: counseling_booking::Model, student: Option<user::Model>) -> Self {
        Self {
            student_name: student.map(|u| u.name),
            ..Self::from(m)
        }
    }
}

// --- Aspirations ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAspirationRequest {
    #[schema(example = "More study rooms during exams")]
    pub title: String,
    pub content: String,
    #[schema(example = "facilities")]
    pub category: Option<String>,
    /// Hide the submitter from staff.
    #[serde(default)]
    pub is_anonymous: bool,
}

impl Validate for CreateAspirationRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_required_text(&self.content, "Content", 10_000)?;
        if let Some(category) = &self.category
            && category.chars().count() > 64
        {
            return Err(AppError::Validation(
                "Category must be at most 64 characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct RespondAspirationRequest {
    pub status: Option<AspirationStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub response: Option<Option<String>>,
}

impl Validate for RespondAspirationRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(Some(response)) = &self.response {
            validate_required_text(response, "Response", 10_000)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AspirationFilter {
    pub status: Option<AspirationStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AspirationResponse {
    #[schema(example = "ASP001")]
    pub id: String,
    /// `null` for anonymous aspirations in staff listings.
    pub user_id: Option<String>,
    pub submitter_name: Option<String>,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub is_anonymous: bool,
    pub status: AspirationStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AspirationResponse {
    /// The submitter's own view.
    pub fn own(m: aspiration::Model) -> Self {
        Self::build(m, None, true)
    }

    /// The staff view: anonymous aspirations carry no submitter.
    pub fn for_staff(m: aspiration::Model, submitter: Option<user::Model>) -> Self {
        let reveal = !m.is_anonymous;
        Self::build(m, submitter.filter(|_| reveal), reveal)
    }

    fn build(m: aspiration::Model, submitter: Option<user::Model>, reveal: bool) -> Self {
        Self {
            id: m.id,
            user_id: reveal.then_some(m.user_id),
            submitter_name: submitter.map(|u| u.name),
            title: m.title,
            content: m.content,
            category: m.category,
            is_anonymous: m.is_anonymous,
            status: m.status,
            response: m.response,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspiration(anonymous: bool) -> aspiration::Model {
        let now = Utc::now();
        aspiration::Model {
            id: "ASP001".into(),
            user_id: "USR001".into(),
            title: "Study rooms".into(),
            content: "Please".into(),
            category: None,
            is_anonymous: anonymous,
            status: AspirationStatus::Submitted,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn student() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: "USR001".into(),
            username: "2201001".into(),
            name: "Siti".into(),
            email: None,
            nim: Some("2201001".into()),
            phone: None,
            faculty: None,
            study_program: None,
            role: common::Role::Student,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn anonymous_aspirations_hide_submitter_from_staff() {
        let view = AspirationResponse::for_staff(aspiration(true), Some(student()));
        assert!(view.user_id.is_none());
        assert!(view.submitter_name.is_none());

        let view = AspirationResponse::for_staff(aspiration(false), Some(student()));
        assert_eq!(view.user_id.as_deref(), Some("USR001"));
        assert_eq!(view.submitter_name.as_deref(), Some("Siti"));
    }

    #[test]
    fn owners_always_see_their_id() {
        let view = AspirationResponse::own(aspiration(true));
        assert_eq!(view.user_id.as_deref(), Some("USR001"));
    }

    #[test]
    fn booking_date_must_parse() {
        let req = CreateBookingRequest {
            topic: "Stress".into(),
            preferred_date: "14/03/2025".into(),
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}
