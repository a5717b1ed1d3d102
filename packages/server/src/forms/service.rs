use std::collections::BTreeMap;

use chrono::Utc;
use common::form::{
    FieldSpec, FieldType, FileKind, FormPolicy, SubmissionCounts, shape_data, validate_submission,
};
use common::sequence::prefix;
use common::storage::{FileStore, StoredPath};
use sea_orm::*;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::multipart::SubmissionPayload;
use crate::entity::{form_field, form_setting, form_submission, scholarship_form, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;
use crate::utils::sequence::next_id;

/// A form with its settings and active fields in display order.
pub struct LoadedForm {
    pub form: scholarship_form::Model,
    pub setting: Option<form_setting::Model>,
    pub fields: Vec<form_field::Model>,
}

impl LoadedForm {
    pub fn policy(&self) -> FormPolicy {
        match &self.setting {
            Some(s) => s.policy(self.form.is_active),
            None => FormPolicy {
                is_active: self.form.is_active,
                ..FormPolicy::default()
            },
        }
    }

    pub fn specs(&self) -> Vec<FieldSpec> {
        self.fields.iter().map(form_field::Model::to_spec).collect()
    }

    fn upload_folder(&self) -> String {
        upload_folder(&self.form.id)
    }
}

fn upload_folder(form_id: &str) -> String {
    format!("submissions/{form_id}")
}

pub async fn load_form<C: ConnectionTrait>(conn: &C, form_id: &str) -> Result<LoadedForm, AppError> {
    let form = scholarship_form::Entity::find_by_id(form_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Form not found".into()))?;

    let setting = form_setting::Entity::find_by_id(form_id.to_string())
        .one(conn)
        .await?;

    let fields = form_field::Entity::find()
        .filter(form_field::Column::FormId.eq(form_id))
        .filter(form_field::Column::IsActive.eq(true))
        .order_by_asc(form_field::Column::SectionIndex)
        .order_by_asc(form_field::Column::FieldIndex)
        .all(conn)
        .await?;

    Ok(LoadedForm {
        form,
        setting,
        fields,
    })
}

pub async fn count_submissions<C: ConnectionTrait>(
    conn: &C,
    form_id: &str,
    user_id: Option<&str>,
) -> Result<SubmissionCounts, DbErr> {
    let total = form_submission::Entity::find()
        .filter(form_submission::Column::FormId.eq(form_id))
        .count(conn)
        .await?;

    let by_caller = match user_id {
        Some(uid) => {
            form_submission::Entity::find()
                .filter(form_submission::Column::FormId.eq(form_id))
                .filter(form_submission::Column::UserId.eq(uid))
                .count(conn)
                .await?
        }
        None => 0,
    };

    Ok(SubmissionCounts { total, by_caller })
}

/// `"open"`, or the rejection code a new submission would currently get.
pub async fn availability<C: ConnectionTrait>(
    conn: &C,
    loaded: &LoadedForm,
    user_id: Option<&str>,
) -> Result<&'static str, DbErr> {
    let policy = loaded.policy();
    if let Err(rejection) = policy.check_open(Utc::now()) {
        return Ok(rejection.code());
    }
    let counts = count_submissions(conn, &loaded.form.id, user_id).await?;
    Ok(match policy.check_capacity(counts) {
        Ok(()) => "open",
        Err(rejection) => rejection.code(),
    })
}

/// Gate, validate, store and persist a new submission.
pub async fn create_submission(
    state: &AppState,
    auth_user: &AuthUser,
    payload: SubmissionPayload,
) -> Result<form_submission::Model, AppError> {
    let form_id = payload
        .form_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("form_id is required".into()))?;

    let loaded = load_form(&state.db, &form_id).await?;
    let policy = loaded.policy();
    let counts = count_submissions(&state.db, &form_id, Some(&auth_user.user_id)).await?;
    policy.check_new_submission(Utc::now(), counts)?;

    let specs = loaded.specs();
    validate_submission(&specs, &payload.values, &payload.upload_meta(), None)?;

    let profile = user::Entity::find_by_id(auth_user.user_id.clone())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let stored = store_uploads(state.files.as_ref(), &loaded.upload_folder(), &payload).await?;
    let shaped = shape_data(&specs, &payload.values, &stored, None);

    let result = insert_submission(
        &state.db,
        &policy,
        &form_id,
        &auth_user.user_id,
        Value::Object(shaped.data),
        personal_data(&profile),
    )
    .await;

    match result {
        Ok(model) => {
            info!(submission_id = %model.id, form_id = %form_id, user = %auth_user.username, "Submission created");
            Ok(model)
        }
        Err(e) => {
            discard(state.files.as_ref(), stored.values()).await;
            Err(e)
        }
    }
}

async fn insert_submission(
    db: &DatabaseConnection,
    policy: &FormPolicy,
    form_id: &str,
    user_id: &str,
    data: Value,
    personal_data: Value,
) -> Result<form_submission::Model, AppError> {
    let txn = db.begin().await?;

    // The sequence bump is the first write and locks out concurrent submitters
    // until commit, so the capacity re-check below sees every committed row.
    let id = next_id(&txn, prefix::FORM_SUBMISSION).await?;
    let counts = count_submissions(&txn, form_id, Some(user_id)).await?;
    policy.check_capacity(counts)?;

    let now = Utc::now();
    let model = form_submission::ActiveModel {
        id: Set(id),
        form_id: Set(form_id.to_string()),
        user_id: Set(user_id.to_string()),
        data: Set(data),
        personal_data: Set(personal_data),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

/// Edit an existing submission in place. Owner only.
pub async fn update_submission(
    state: &AppState,
    auth_user: &AuthUser,
    submission_id: &str,
    payload: SubmissionPayload,
) -> Result<form_submission::Model, AppError> {
    let existing = find_owned(&state.db, auth_user, submission_id).await?;

    if let Some(form_id) = payload.form_id.as_deref()
        && !form_id.is_empty()
        && form_id != existing.form_id
    {
        return Err(AppError::Validation(
            "form_id does not match the submission".into(),
        ));
    }

    let loaded = load_form(&state.db, &existing.form_id).await?;
    loaded.policy().check_edit(Utc::now())?;

    let specs = loaded.specs();
    let folder = loaded.upload_folder();
    let previous = own_files(&specs, string_values(&existing.data), &folder);
    validate_submission(
        &specs,
        &payload.values,
        &payload.upload_meta(),
        Some(&previous),
    )?;

    let stored = store_uploads(state.files.as_ref(), &folder, &payload).await?;
    let shaped = shape_data(&specs, &payload.values, &stored, Some(&previous));

    // Files of fields that are no longer active drop out of the data too.
    let mut obsolete = shaped.replaced;
    for (key, value) in &previous {
        if !shaped.data.contains_key(key)
            && let Some(path) = stored_path_in(value, &folder)
        {
            obsolete.push(path);
        }
    }

    let result = async {
        let txn = state.db.begin().await?;
        let mut active: form_submission::ActiveModel =
            form_submission::Entity::find_by_id(existing.id.clone())
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Submission not found".into()))?
                .into();
        active.data = Set(Value::Object(shaped.data));
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    match result {
        Ok(model) => {
            discard(state.files.as_ref(), obsolete.iter()).await;
            info!(submission_id = %model.id, user = %auth_user.username, "Submission updated");
            Ok(model)
        }
        Err(e) => {
            discard(state.files.as_ref(), stored.values()).await;
            Err(e)
        }
    }
}

/// Delete a submission and, afterwards, its uploaded files. Owner only.
pub async fn delete_submission(
    state: &AppState,
    auth_user: &AuthUser,
    submission_id: &str,
) -> Result<(), AppError> {
    let existing = find_owned(&state.db, auth_user, submission_id).await?;

    form_submission::Entity::delete_by_id(existing.id.clone())
        .exec(&state.db)
        .await?;

    let folder = upload_folder(&existing.form_id);
    let files: Vec<StoredPath> = string_values(&existing.data)
        .values()
        .filter_map(|v| stored_path_in(v, &folder))
        .collect();
    discard(state.files.as_ref(), files.iter()).await;

    info!(submission_id = %existing.id, user = %auth_user.username, "Submission deleted");
    Ok(())
}

async fn find_owned(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    submission_id: &str,
) -> Result<form_submission::Model, AppError> {
    let existing = form_submission::Entity::find_by_id(submission_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;
    if existing.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    Ok(existing)
}

/// Write every uploaded file, removing the ones already written if a later one fails.
async fn store_uploads(
    files: &dyn FileStore,
    folder: &str,
    payload: &SubmissionPayload,
) -> Result<BTreeMap<String, StoredPath>, AppError> {
    let mut stored = BTreeMap::new();
    for (key, upload) in &payload.files {
        let Some(kind) = FileKind::from_file_name(&upload.file_name) else {
            continue;
        };
        match files.put(folder, kind.extension(), &upload.bytes).await {
            Ok(path) => {
                stored.insert(key.clone(), path);
            }
            Err(e) => {
                discard(files, stored.values()).await;
                return Err(e.into());
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal of stored files.
pub async fn discard<'a>(files: &dyn FileStore, paths: impl Iterator<Item = &'a StoredPath>) {
    for path in paths {
        if let Err(e) = files.delete(path).await {
            warn!(path = %path, error = %e, "Failed to delete stored file");
        }
    }
}

fn stored_path_in(value: &str, folder: &str) -> Option<StoredPath> {
    value
        .strip_prefix(folder)
        .filter(|rest| rest.starts_with('/'))
        .and_then(|_| StoredPath::parse(value).ok())
}

/// Drop prior values of file fields that do not point into this form's upload
/// folder. A field retyped from text to file may hold any path.
fn own_files(
    specs: &[FieldSpec],
    mut previous: BTreeMap<String, String>,
    folder: &str,
) -> BTreeMap<String, String> {
    previous.retain(|key, value| {
        let is_file = specs
            .iter()
            .any(|f| &f.key == key && f.field_type == FieldType::File);
        !is_file || stored_path_in(value, folder).is_some()
    });
    previous
}

/// The string-valued entries of a stored data document.
pub fn string_values(data: &Value) -> BTreeMap<String, String> {
    data.as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn personal_data(profile: &user::Model) -> Value {
    json!({
        "username": profile.username,
        "name": profile.name,
        "email": profile.email,
        "nim": profile.nim,
        "phone": profile.phone,
        "faculty": profile.faculty,
        "study_program": profile.study_program,
    })
}
