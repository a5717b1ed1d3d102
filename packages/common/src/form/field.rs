#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted size of a single uploaded file (2 MB).
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Input type of a form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "text"))]
    Text,
    /// Calendar date, `YYYY-MM-DD`.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "date"))]
    Date,
    /// Uploaded document or image.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "file"))]
    File,
    /// One of a fixed list of options.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "dropdown"))]
    Dropdown,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::File => "file",
            Self::Dropdown => "dropdown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The file types a file field accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Jpeg,
    Png,
}

impl FileKind {
    /// Human-readable list used in rejection messages.
    pub const ALLOWED: &'static str = "pdf, jpeg, png";

    /// Classify an uploaded file by the extension of its client-side name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.trim().rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Canonical extension used for the stored copy.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// A field as the validator sees it: only the active fields of a form, in display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Vec<String>,
}

/// What the validator needs to know about an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadMeta {
    pub file_name: String,
    pub size: u64,
}

/// Field keys are stable identifiers inside submission data: 1-64 chars of
/// lowercase ASCII letters, digits and underscores, starting with a letter.
pub fn validate_field_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() || key.len() > 64 {
        return Err("Field key must be 1-64 characters");
    }
    if !key.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err("Field key must start with a lowercase letter");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Field key may contain only lowercase letters, digits and underscores");
    }
    Ok(())
}
