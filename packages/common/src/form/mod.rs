//! Scholarship form engine: field schema, settings gate and submission validation.
//!
//! Everything here is pure and storage-agnostic. The server loads a form's
//! settings and fields, counts existing submissions, and feeds them through
//! [`FormPolicy`] and [`validate_submission`] before anything is written.

mod field;
mod policy;
mod rejection;
mod validate;

pub use field::{FieldSpec, FieldType, FileKind, MAX_FILE_SIZE, UploadMeta, validate_field_key};
pub use policy::{FormPolicy, SubmissionCounts};
pub use rejection::Rejection;
pub use validate::{ShapedData, shape_data, validate_submission};
