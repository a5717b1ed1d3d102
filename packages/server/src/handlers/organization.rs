use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::OrganizationKind;
use sea_orm::*;
use tracing::instrument;

use crate::entity::organization_profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::content::{OrganizationResponse, UpdateOrganizationRequest};
use crate::models::shared::trim_opt;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/organizations/{kind}",
    tag = "Organizations",
    operation_id = "getOrganization",
    summary = "Get a student organization profile",
    params(("kind" = String, Path, description = "`bem` or `mpm`")),
    responses(
        (status = 200, description = "Profile", body = OrganizationResponse),
        (status = 404, description = "Unknown organization (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let model = organization_profile::Entity::find_by_id(kind.as_str().to_string())
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/organizations/{kind}",
    tag = "Organizations",
    operation_id = "updateOrganization",
    summary = "Replace a student organization profile",
    description = "Allowed for holders of `organization:edit:<kind>`: administrators and the organization's own officers.",
    params(("kind" = String, Path, description = "`bem` or `mpm`")),
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Profile saved", body = OrganizationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown organization (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn update_organization(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    AppJson(payload): AppJson<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    auth_user.require_permission(kind.edit_permission())?;

    let model = organization_profile::ActiveModel {
        kind: Set(kind.as_str().to_string()),
        name: Set(payload.name.trim().to_string()),
        vision: Set(trim_opt(payload.vision)),
        mission: Set(trim_opt(payload.mission)),
        description: Set(trim_opt(payload.description)),
        updated_at: Set(Utc::now()),
    };

    let exists = organization_profile::Entity::find_by_id(kind.as_str().to_string())
        .one(&state.db)
        .await?
        .is_some();
    let saved = if exists {
        model.update(&state.db).await?
    } else {
        model.insert(&state.db).await?
    };

    tracing::info!(kind = kind.as_str(), "Organization profile updated");
    Ok(Json(saved.into()))
}

fn parse_kind(raw: &str) -> Result<OrganizationKind, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "bem" => Ok(OrganizationKind::Bem),
        "mpm" => Ok(OrganizationKind::Mpm),
        _ => Err(AppError::NotFound("Organization not found".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!(parse_kind("BEM").unwrap(), OrganizationKind::Bem);
        assert_eq!(parse_kind("mpm").unwrap(), OrganizationKind::Mpm);
        assert!(parse_kind("dpm").is_err());
    }
}
