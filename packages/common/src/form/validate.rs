use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::field::{FieldSpec, FieldType, FileKind, MAX_FILE_SIZE, UploadMeta};
use super::rejection::Rejection;
use crate::storage::StoredPath;

/// Check raw values and uploads against the active fields of a form.
///
/// `previous` holds the stored data of the submission being edited, if any;
/// a file field without a new upload is satisfied by its previous path.
pub fn validate_submission(
    fields: &[FieldSpec],
    values: &BTreeMap<String, String>,
    files: &BTreeMap<String, UploadMeta>,
    previous: Option<&BTreeMap<String, String>>,
) -> Result<(), Rejection> {
    for key in values.keys().chain(files.keys()) {
        if !fields.iter().any(|f| &f.key == key) {
            return Err(Rejection::UnknownField { key: key.clone() });
        }
    }

    for field in fields {
        let label = || field.label.clone();

        if field.field_type == FieldType::File {
            if values.get(&field.key).is_some_and(|v| !v.trim().is_empty()) {
                return Err(Rejection::ExpectedFile { label: label() });
            }
            match files.get(&field.key) {
                Some(upload) => check_upload(field, upload)?,
                None => {
                    let kept = previous
                        .and_then(|p| p.get(&field.key))
                        .is_some_and(|v| !v.is_empty());
                    if field.required && !kept {
                        return Err(Rejection::FieldRequired { label: label() });
                    }
                }
            }
            continue;
        }

        if files.contains_key(&field.key) {
            return Err(Rejection::UnexpectedFile { label: label() });
        }

        let value = values.get(&field.key).map(|v| v.trim()).unwrap_or("");
        if value.is_empty() {
            if field.required {
                return Err(Rejection::FieldRequired { label: label() });
            }
            continue;
        }

        match field.field_type {
            FieldType::Date => {
                if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                    return Err(Rejection::InvalidDate { label: label() });
                }
            }
            FieldType::Dropdown => {
                if !field.options.is_empty() && !field.options.iter().any(|o| o == value) {
                    return Err(Rejection::InvalidOption {
                        label: label(),
                        options: field.options.join(", "),
                    });
                }
            }
            FieldType::Text | FieldType::File => {}
        }
    }

    Ok(())
}

fn check_upload(field: &FieldSpec, upload: &UploadMeta) -> Result<(), Rejection> {
    if FileKind::from_file_name(&upload.file_name).is_none() {
        return Err(Rejection::InvalidFileType {
            label: field.label.clone(),
            allowed: FileKind::ALLOWED,
        });
    }
    if upload.size > MAX_FILE_SIZE {
        return Err(Rejection::FileTooLarge {
            label: field.label.clone(),
            max_kb: MAX_FILE_SIZE / 1024,
        });
    }
    Ok(())
}

/// The document persisted for a submission, plus blobs made obsolete by it.
#[derive(Debug, Default, PartialEq)]
pub struct ShapedData {
    pub data: Map<String, Value>,
    /// Previously stored files replaced by a new upload. Delete after commit.
    pub replaced: Vec<StoredPath>,
}

/// Build the persisted field-key → value mapping.
///
/// Text-like fields carry their trimmed value; file fields carry the stored
/// path of the new upload, or the previous path when none was sent. Fields
/// left empty are omitted.
pub fn shape_data(
    fields: &[FieldSpec],
    values: &BTreeMap<String, String>,
    stored: &BTreeMap<String, StoredPath>,
    previous: Option<&BTreeMap<String, String>>,
) -> ShapedData {
    let mut shaped = ShapedData::default();

    for field in fields {
        let prior = previous
            .and_then(|p| p.get(&field.key))
            .filter(|v| !v.is_empty());

        if field.field_type == FieldType::File {
            if let Some(path) = stored.get(&field.key) {
                if let Some(old) = prior.and_then(|v| StoredPath::parse(v).ok())
                    && &old != path
                {
                    shaped.replaced.push(old);
                }
                shaped
                    .data
                    .insert(field.key.clone(), Value::String(path.to_string()));
            } else if let Some(old) = prior {
                shaped
                    .data
                    .insert(field.key.clone(), Value::String(old.clone()));
            }
            continue;
        }

        if let Some(value) = values.get(&field.key).map(|v| v.trim())
            && !value.is_empty()
        {
            shaped
                .data
                .insert(field.key.clone(), Value::String(value.to_string()));
        }
    }

    shaped
}
