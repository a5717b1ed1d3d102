//! Scholarship form submissions: multipart intake, gating, storage and persistence.

pub mod multipart;
pub mod service;

pub use multipart::{SubmissionPayload, UploadedFile};
