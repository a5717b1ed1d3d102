use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Request payload checks run by the `AppJson` extractor after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// A page of list results.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Common list query parameters.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, 1-based. Defaults to 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Defaults to 20.
    pub per_page: Option<u64>,
    /// Case-insensitive title search.
    pub search: Option<String>,
}

impl ListQuery {
    /// Normalized `(page, per_page)`.
    pub fn page_params(&self) -> (u64, u64) {
        let page = Ord::max(self.page.unwrap_or(1), 1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }

    /// Trimmed, LIKE-escaped, lowercased search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s).to_lowercase()))
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    validate_required_text(title, "Title", 256)
}

/// Validate a trimmed required text field (1-`max` Unicode characters).
pub fn validate_required_text(value: &str, name: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{name} must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an optional display position (must be >= 0 when present).
pub fn validate_optional_position(pos: Option<i32>) -> Result<(), AppError> {
    if let Some(pos) = pos
        && pos < 0
    {
        return Err(AppError::Validation("Position must be >= 0".into()));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str, name: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{name} must be a date in YYYY-MM-DD format")))
}

/// Trim an optional text value, mapping blank to `None`.
pub fn trim_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_clamp() {
        let q = ListQuery {
            page: Some(0),
            per_page: Some(500),
            search: None,
        };
        assert_eq!(q.page_params(), (1, 100));
        assert_eq!(ListQuery::default().page_params(), (1, 20));
    }

    #[test]
    fn search_term_escapes_wildcards() {
        let q = ListQuery {
            search: Some("  100%_Beasiswa ".into()),
            ..Default::default()
        };
        assert_eq!(q.search_term().unwrap(), "%100\\%\\_beasiswa%");
        let blank = ListQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.search_term().is_none());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 41).total_pages, 3);
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
    }

    #[test]
    fn double_option_distinguishes_null_and_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            note: Option<Option<String>>,
        }
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"note":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"note":"x"}"#).unwrap();
        assert_eq!(absent.note, None);
        assert_eq!(null.note, Some(None));
        assert_eq!(set.note, Some(Some("x".into())));
    }

    #[test]
    fn title_bounds() {
        assert!(validate_title("  ").is_err());
        assert!(validate_title("Beasiswa KIP").is_ok());
        assert!(validate_title(&"a".repeat(257)).is_err());
    }
}
