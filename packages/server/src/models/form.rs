use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::form::{FieldType, validate_field_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::{Validate, double_option, validate_required_text, validate_title};
use crate::entity::{form_field, form_setting, form_submission, scholarship, scholarship_form};
use crate::error::AppError;

// --- Scholarships ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScholarshipRequest {
    #[schema(example = "Beasiswa KIP Kuliah")]
    pub title: String,
    pub provider: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for CreateScholarshipRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_required_text(&self.description, "Description", 20_000)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateScholarshipRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub provider: Option<Option<String>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub requirements: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateScholarshipRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_required_text(description, "Description", 20_000)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScholarshipResponse {
    #[schema(example = "SCH001")]
    pub id: String,
    pub title: String,
    pub provider: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<scholarship::Model> for ScholarshipResponse {
    fn from(m: scholarship::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            provider: m.provider,
            description: m.description,
            requirements: m.requirements,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A scholarship with the forms students can currently see.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ScholarshipDetailResponse {
    #[serde(flatten)]
    pub scholarship: ScholarshipResponse,
    pub forms: Vec<FormResponse>,
}

// --- Forms ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateFormRequest {
    #[schema(example = "SCH001")]
    pub scholarship_id: String,
    #[schema(example = "Pendaftaran KIP Kuliah 2025")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for CreateFormRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.scholarship_id.trim().is_empty() {
            return Err(AppError::Validation("scholarship_id is required".into()));
        }
        validate_title(&self.title)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateFormRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FormResponse {
    #[schema(example = "FRM001")]
    pub id: String,
    pub scholarship_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<scholarship_form::Model> for FormResponse {
    fn from(m: scholarship_form::Model) -> Self {
        Self {
            id: m.id,
            scholarship_id: m.scholarship_id,
            title: m.title,
            description: m.description,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// One field in a schema replacement.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FieldInput {
    #[serde(default)]
    pub section_index: i32,
    pub section_title: Option<String>,
    /// Stable key, `[a-z][a-z0-9_]*`, unique within the form.
    #[schema(example = "transcript")]
    pub key: String,
    #[schema(example = "Academic transcript")]
    pub label: String,
    pub field_type: FieldType,
    /// Choices for dropdown fields.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Replace the full field schema of a form. Field order within a section
/// follows array order.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReplaceFieldsRequest {
    pub fields: Vec<FieldInput>,
}

impl Validate for ReplaceFieldsRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.fields.len() > 200 {
            return Err(AppError::Validation("Too many fields: max 200".into()));
        }
        let mut keys = HashSet::new();
        for field in &self.fields {
            validate_field_key(&field.key).map_err(|msg| AppError::Validation(msg.into()))?;
            if !keys.insert(field.key.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate field key '{}'",
                    field.key
                )));
            }
            validate_required_text(&field.label, "Label", 256)?;
            if field.section_index < 0 {
                return Err(AppError::Validation("section_index must be >= 0".into()));
            }
            match field.field_type {
                FieldType::Dropdown => {
                    if field.options.iter().all(|o| o.trim().is_empty()) {
                        return Err(AppError::Validation(format!(
                            "Dropdown field '{}' needs at least one option",
                            field.key
                        )));
                    }
                }
                _ if !field.options.is_empty() => {
                    return Err(AppError::Validation(format!(
                        "Only dropdown fields take options ('{}')",
                        field.key
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FieldResponse {
    #[schema(example = "FLD001")]
    pub id: String,
    pub section_index: i32,
    pub section_title: Option<String>,
    pub field_index: i32,
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub required: bool,
    pub is_active: bool,
}

impl From<form_field::Model> for FieldResponse {
    fn from(m: form_field::Model) -> Self {
        let options = m.option_list();
        Self {
            id: m.id,
            section_index: m.section_index,
            section_title: m.section_title,
            field_index: m.field_index,
            key: m.key,
            label: m.label,
            field_type: m.field_type,
            options,
            required: m.required,
            is_active: m.is_active,
        }
    }
}

/// Per-form submission settings. Replaces the current settings entirely.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FormSettingsRequest {
    #[serde(default = "default_true")]
    pub accept_responses: bool,
    #[serde(default)]
    pub one_submission_per_email: bool,
    #[serde(default)]
    pub allow_edit: bool,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    /// Maximum number of submissions across all users.
    pub max_submissions: Option<i32>,
}

impl Validate for FormSettingsRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let (Some(start), Some(deadline)) = (self.submission_start, self.submission_deadline)
            && start > deadline
        {
            return Err(AppError::Validation(
                "submission_start must not be after submission_deadline".into(),
            ));
        }
        if let Some(max) = self.max_submissions
            && max < 1
        {
            return Err(AppError::Validation("max_submissions must be >= 1".into()));
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FormSettingsResponse {
    pub accept_responses: bool,
    pub one_submission_per_email: bool,
    pub allow_edit: bool,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub max_submissions: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Option<form_setting::Model>> for FormSettingsResponse {
    fn from(m: Option<form_setting::Model>) -> Self {
        match m {
            Some(m) => Self {
                accept_responses: m.accept_responses,
                one_submission_per_email: m.one_submission_per_email,
                allow_edit: m.allow_edit,
                submission_start: m.submission_start,
                submission_deadline: m.submission_deadline,
                max_submissions: m.max_submissions,
                updated_at: Some(m.updated_at),
            },
            None => Self {
                accept_responses: true,
                one_submission_per_email: false,
                allow_edit: false,
                submission_start: None,
                submission_deadline: None,
                max_submissions: None,
                updated_at: None,
            },
        }
    }
}

/// A form's schema, settings and current availability.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FormDetailResponse {
    pub form: FormResponse,
    pub settings: FormSettingsResponse,
    pub fields: Vec<FieldResponse>,
    /// `open`, or the rejection code a new submission would receive.
    #[schema(example = "open")]
    pub availability: String,
}

// --- Submissions ---

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    #[schema(example = "FSUB001")]
    pub id: String,
    pub form_id: String,
    pub user_id: String,
    /// Field key → value. File fields hold the stored relative path.
    #[schema(value_type = Object)]
    pub data: Value,
    /// Submitter profile at submission time.
    #[schema(value_type = Object)]
    pub personal_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<form_submission::Model> for SubmissionResponse {
    fn from(m: form_submission::Model) -> Self {
        Self {
            id: m.id,
            form_id: m.form_id,
            user_id: m.user_id,
            data: m.data,
            personal_data: m.personal_data,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionCreatedResponse {
    #[schema(example = "FSUB001")]
    pub id: String,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
