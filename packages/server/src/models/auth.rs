use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use super::shared::Validate;
use crate::error::AppError;

/// Request body for login. Credentials are checked by the institution's identity service.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Institutional username, usually the student number.
    #[schema(example = "2201001")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("Username must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("Password must not be empty".into()));
        }
        Ok(())
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
    /// Permissions granted through the user's role.
    #[schema(example = json!(["submission:submit", "counseling:book"]))]
    pub permissions: Vec<String>,
}

/// A local user profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "USR001")]
    pub id: String,
    #[schema(example = "2201001")]
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub nim: Option<String>,
    pub phone: Option<String>,
    pub faculty: Option<String>,
    pub study_program: Option<String>,
    pub role: Role,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(m: crate::entity::user::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            name: m.name,
            email: m.email,
            nim: m.nim,
            phone: m.phone,
            faculty: m.faculty,
            study_program: m.study_program,
            role: m.role,
            last_login_at: m.last_login_at,
        }
    }
}

/// Current authenticated user's profile and permissions.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    #[schema(example = json!(["submission:submit"]))]
    pub permissions: Vec<String>,
}
