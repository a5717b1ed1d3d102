//! Human-readable sequential identifiers such as `FSUB001` or `csl014`.

/// Width the numeric suffix is zero-padded to. Longer numbers are kept intact.
pub const DEFAULT_WIDTH: usize = 3;

/// Identifier prefixes per entity.
pub mod prefix {
    pub const USER: &str = "USR";
    pub const SCHOLARSHIP: &str = "SCH";
    pub const FORM: &str = "FRM";
    pub const FORM_FIELD: &str = "FLD";
    pub const FORM_SUBMISSION: &str = "FSUB";
    pub const NEWS: &str = "NWS";
    pub const NEWS_CATEGORY: &str = "NCT";
    pub const ANNOUNCEMENT: &str = "ANN";
    pub const ACHIEVEMENT: &str = "ACH";
    pub const DOWNLOAD: &str = "DWN";
    pub const CAROUSEL_SLIDE: &str = "CRS";
    pub const DIRECTOR: &str = "DIR";
    pub const COUNSELING: &str = "csl";
    pub const ASPIRATION: &str = "ASP";
    pub const CHATBOT_RULE: &str = "BOT";
}

/// Render `prefix` followed by `value` zero-padded to `width` digits.
pub fn format_identifier(prefix: &str, value: u64, width: usize) -> String {
    format!("{prefix}{value:0width$}")
}

/// Extract the numeric suffix of an identifier carrying `prefix`.
pub fn parse_suffix(prefix: &str, id: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
