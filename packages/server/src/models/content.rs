use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{
    Validate, double_option, validate_optional_position, validate_required_text, validate_title,
};
use crate::entity::{
    achievement, announcement, carousel_slide, director, download, news, news_category,
    organization_profile,
};
use crate::error::AppError;

const CONTENT_MAX: usize = 100_000;
const SHORT_MAX: usize = 256;

fn validate_optional_text(value: &Option<String>, name: &str, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{name} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn validate_link(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    if url.starts_with('/') || url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Validation(
            "link_url must be an absolute http(s) URL or a site path".into(),
        ))
    }
}

fn validate_year(year: i32) -> Result<(), AppError> {
    if !(1950..=2100).contains(&year) {
        return Err(AppError::Validation("year must be between 1950 and 2100".into()));
    }
    Ok(())
}

// --- News ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateNewsRequest {
    #[schema(example = "Pembukaan Pendaftaran PKM 2025")]
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    #[schema(example = "NCT001")]
    pub category_id: Option<String>,
    /// Path returned by the upload endpoint.
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl Validate for CreateNewsRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_optional_text(&self.summary, "Summary", 1_000)?;
        validate_required_text(&self.content, "Content", CONTENT_MAX)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub summary: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail_path: Option<Option<String>>,
    pub is_published: Option<bool>,
}

impl Validate for UpdateNewsRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(summary) = &self.summary {
            validate_optional_text(summary, "Summary", 1_000)?;
        }
        if let Some(content) = &self.content {
            validate_required_text(content, "Content", CONTENT_MAX)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewsResponse {
    #[schema(example = "NWS001")]
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub category_id: Option<String>,
    pub thumbnail_path: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<news::Model> for NewsResponse {
    fn from(m: news::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            summary: m.summary,
            content: m.content,
            category_id: m.category_id,
            thumbnail_path: m.thumbnail_path,
            is_published: m.is_published,
            published_at: m.published_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewsFilter {
    /// Only news in this category.
    pub category_id: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Prestasi")]
    pub name: String,
}

impl Validate for CategoryRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "Name", 100)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    #[schema(example = "NCT001")]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<news_category::Model> for CategoryResponse {
    fn from(m: news_category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

// --- Announcements ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
}

impl Validate for CreateAnnouncementRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_required_text(&self.content, "Content", CONTENT_MAX)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
}

impl Validate for UpdateAnnouncementRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_required_text(content, "Content", CONTENT_MAX)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    #[schema(example = "ANN001")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(m: announcement::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            is_published: m.is_published,
            published_at: m.published_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// --- Achievements ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAchievementRequest {
    #[schema(example = "Juara 1 Gemastik")]
    pub title: String,
    pub student_name: String,
    #[schema(example = "national")]
    pub level: String,
    #[schema(example = 2025)]
    pub year: i32,
    pub description: Option<String>,
    pub image_path: Option<String>,
}

impl Validate for CreateAchievementRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_required_text(&self.student_name, "Student name", SHORT_MAX)?;
        validate_required_text(&self.level, "Level", 64)?;
        validate_year(self.year)?;
        validate_optional_text(&self.description, "Description", CONTENT_MAX)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAchievementRequest {
    pub title: Option<String>,
    pub student_name: Option<String>,
    pub level: Option<String>,
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_path: Option<Option<String>>,
}

impl Validate for UpdateAchievementRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(name) = &self.student_name {
            validate_required_text(name, "Student name", SHORT_MAX)?;
        }
        if let Some(level) = &self.level {
            validate_required_text(level, "Level", 64)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AchievementResponse {
    #[schema(example = "ACH001")]
    pub id: String,
    pub title: String,
    pub student_name: String,
    pub level: String,
    pub year: i32,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<achievement::Model> for AchievementResponse {
    fn from(m: achievement::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            student_name: m.student_name,
            level: m.level,
            year: m.year,
            description: m.description,
            image_path: m.image_path,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// --- Downloads ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDownloadRequest {
    #[schema(example = "Panduan KIP Kuliah")]
    pub title: String,
    pub description: Option<String>,
    /// Path returned by the upload endpoint.
    #[schema(example = "downloads/0b6f1f3e-8f7a-4c55-9d0e-2f0c6a1e3b7d.pdf")]
    pub file_path: String,
    /// Name offered to visitors. Defaults to the title plus the file's extension.
    pub file_name: Option<String>,
}

impl Validate for CreateDownloadRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_optional_text(&self.description, "Description", CONTENT_MAX)?;
        validate_optional_text(&self.file_name, "File name", SHORT_MAX)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateDownloadRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
}

impl Validate for UpdateDownloadRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(name) = &self.file_name {
            validate_required_text(name, "File name", SHORT_MAX)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DownloadResponse {
    #[schema(example = "DWN001")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    /// File size in bytes.
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<download::Model> for DownloadResponse {
    fn from(m: download::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            file_path: m.file_path,
            file_name: m.file_name,
            size: m.size,
            created_at: m.created_at,
        }
    }
}

// --- Carousel ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSlideRequest {
    pub title: String,
    pub image_path: String,
    pub link_url: Option<String>,
    /// Display order. Appended after the last slide when absent.
    pub position: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for CreateSlideRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_optional_position(self.position)?;
        if let Some(url) = &self.link_url {
            validate_link(url)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSlideRequest {
    pub title: Option<String>,
    pub image_path: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub link_url: Option<Option<String>>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateSlideRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_optional_position(self.position)?;
        if let Some(Some(url)) = &self.link_url {
            validate_link(url)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SlideResponse {
    #[schema(example = "CRS001")]
    pub id: String,
    pub title: String,
    pub image_path: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<carousel_slide::Model> for SlideResponse {
    fn from(m: carousel_slide::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            image_path: m.image_path,
            link_url: m.link_url,
            position: m.position,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

// --- Directors ---

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDirectorRequest {
    pub name: String,
    #[schema(example = "Direktur Kemahasiswaan")]
    pub position_title: String,
    #[schema(example = "2022-2026")]
    pub period: Option<String>,
    pub photo_path: Option<String>,
    /// Display order. Appended after the last entry when absent.
    pub position: Option<i32>,
}

impl Validate for CreateDirectorRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "Name", SHORT_MAX)?;
        validate_required_text(&self.position_title, "Position title", SHORT_MAX)?;
        validate_optional_text(&self.period, "Period", 64)?;
        validate_optional_position(self.position)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateDirectorRequest {
    pub name: Option<String>,
    pub position_title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub period: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo_path: Option<Option<String>>,
    pub position: Option<i32>,
}

impl Validate for UpdateDirectorRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_required_text(name, "Name", SHORT_MAX)?;
        }
        if let Some(title) = &self.position_title {
            validate_required_text(title, "Position title", SHORT_MAX)?;
        }
        validate_optional_position(self.position)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DirectorResponse {
    #[schema(example = "DIR001")]
    pub id: String,
    pub name: String,
    pub position_title: String,
    pub period: Option<String>,
    pub photo_path: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<director::Model> for DirectorResponse {
    fn from(m: director::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            position_title: m.position_title,
            period: m.period,
            photo_path: m.photo_path,
            position: m.position,
            created_at: m.created_at,
        }
    }
}

// --- Organization profiles ---

/// Full replacement of an organization profile.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateOrganizationRequest {
    #[schema(example = "Badan Eksekutif Mahasiswa")]
    pub name: String,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateOrganizationRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "Name", SHORT_MAX)?;
        validate_optional_text(&self.vision, "Vision", CONTENT_MAX)?;
        validate_optional_text(&self.mission, "Mission", CONTENT_MAX)?;
        validate_optional_text(&self.description, "Description", CONTENT_MAX)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OrganizationResponse {
    #[schema(example = "bem")]
    pub kind: String,
    pub name: String,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<organization_profile::Model> for OrganizationResponse {
    fn from(m: organization_profile::Model) -> Self {
        Self {
            kind: m.kind,
            name: m.name,
            vision: m.vision,
            mission: m.mission,
            description: m.description,
            updated_at: m.updated_at,
        }
    }
}

// --- Uploads ---

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Relative path to reference from content records; served under `/storage/`.
    #[schema(example = "news/0b6f1f3e-8f7a-4c55-9d0e-2f0c6a1e3b7d.png")]
    pub path: String,
    pub size: u64,
    #[schema(example = "image/png")]
    pub content_type: String,
}

fn default_true() -> bool {
    true
}
