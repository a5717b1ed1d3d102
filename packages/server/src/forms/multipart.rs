use std::collections::BTreeMap;

use axum::extract::Multipart;
use common::form::{MAX_FILE_SIZE, UploadMeta};

use crate::error::AppError;

/// A file part of a submission request.
///
/// Bytes beyond [`MAX_FILE_SIZE`] are counted but not buffered, so the
/// validator can still report the size against the field's label.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn meta(&self) -> UploadMeta {
        UploadMeta {
            file_name: self.file_name.clone(),
            size: self.size,
        }
    }
}

/// The parts of a `multipart/form-data` submission, keyed by field key.
#[derive(Debug, Default)]
pub struct SubmissionPayload {
    pub form_id: Option<String>,
    pub values: BTreeMap<String, String>,
    pub files: BTreeMap<String, UploadedFile>,
}

impl SubmissionPayload {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut payload = SubmissionPayload::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);

            if name == "form_id" {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                payload.form_id = Some(text.trim().to_string());
                continue;
            }

            if payload.values.contains_key(&name) || payload.files.contains_key(&name) {
                return Err(AppError::Validation(format!("Duplicate field '{name}'")));
            }

            match file_name {
                Some(file_name) => {
                    let mut size = 0u64;
                    let mut bytes = Vec::new();
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?
                    {
                        size += chunk.len() as u64;
                        if size <= MAX_FILE_SIZE {
                            bytes.extend_from_slice(&chunk);
                        } else {
                            bytes = Vec::new();
                        }
                    }
                    // Browsers send an empty part for a file input left blank.
                    if file_name.is_empty() && size == 0 {
                        continue;
                    }
                    payload.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            size,
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?;
                    payload.values.insert(name, text);
                }
            }
        }

        Ok(payload)
    }

    pub fn upload_meta(&self) -> BTreeMap<String, UploadMeta> {
        self.files
            .iter()
            .map(|(key, file)| (key.clone(), file.meta()))
            .collect()
    }
}
