use chrono::{DateTime, Utc};

/// Why a submission attempt was turned away.
///
/// Gate rejections come first in [`FormPolicy`](super::FormPolicy) order;
/// field rejections name the offending field by its label.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("This form is not active")]
    FormInactive,
    #[error("This form is no longer accepting responses")]
    ResponsesClosed,
    #[error("Submissions open at {opens_at}")]
    NotYetOpen { opens_at: DateTime<Utc> },
    #[error("The submission deadline ({deadline}) has passed")]
    DeadlinePassed { deadline: DateTime<Utc> },
    #[error("This form has reached its limit of {max} submissions")]
    QuotaReached { max: u32 },
    #[error("You have already submitted this form")]
    AlreadySubmitted,
    #[error("Submissions to this form cannot be edited")]
    EditNotAllowed,
    #[error("Unknown field '{key}'")]
    UnknownField { key: String },
    #[error("{label} is required")]
    FieldRequired { label: String },
    #[error("{label} must be uploaded as a file")]
    ExpectedFile { label: String },
    #[error("{label} does not accept file uploads")]
    UnexpectedFile { label: String },
    #[error("{label} must be a date in YYYY-MM-DD format")]
    InvalidDate { label: String },
    #[error("{label} must be one of: {options}")]
    InvalidOption { label: String, options: String },
    #[error("{label} must be a file of type: {allowed}")]
    InvalidFileType { label: String, allowed: &'static str },
    #[error("{label} must not be larger than {max_kb} KB")]
    FileTooLarge { label: String, max_kb: u64 },
}

impl Rejection {
    /// Machine-readable code returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FormInactive => "FORM_INACTIVE",
            Self::ResponsesClosed => "RESPONSES_CLOSED",
            Self::NotYetOpen { .. } => "NOT_YET_OPEN",
            Self::DeadlinePassed { .. } => "DEADLINE_PASSED",
            Self::QuotaReached { .. } => "QUOTA_REACHED",
            Self::AlreadySubmitted => "ALREADY_SUBMITTED",
            Self::EditNotAllowed => "EDIT_NOT_ALLOWED",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::FieldRequired { .. } => "FIELD_REQUIRED",
            Self::ExpectedFile { .. } => "EXPECTED_FILE",
            Self::UnexpectedFile { .. } => "UNEXPECTED_FILE",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::InvalidOption { .. } => "INVALID_OPTION",
            Self::InvalidFileType { .. } => "INVALID_FILE_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
        }
    }
}
