use axum::{Json, extract::State};
use chrono::Utc;
use common::Role;
use common::sequence::prefix;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::integrations::identity::ExternalUser;
use crate::models::auth::{LoginRequest, LoginResponse, MeResponse, UserResponse};
use crate::state::AppState;
use crate::utils::{jwt, sequence::next_id};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in through the identity service",
    description = "Verifies the credentials with the institution's identity service, maps the reported role onto an internal role, upserts the local user and returns a signed JWT.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Role has no internal counterpart (ROLE_NOT_MAPPED)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Identity service unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = payload.username.trim();

    let external = state
        .identity
        .authenticate(username, &payload.password)
        .await
        .inspect_err(|e| tracing::warn!(user = %username, error = %e, "Identity check failed"))?;

    let role = Role::from_external(&external.role).ok_or_else(|| {
        tracing::warn!(user = %username, role = %external.role, "Unmapped identity role");
        AppError::RoleNotMapped(external.role.clone())
    })?;

    let user = upsert_user(&state.db, &external, role).await?;
    let permissions = permissions_for(&state.db, role).await?;

    let token = jwt::sign(
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
        &user.id,
        &user.username,
        role.as_str(),
        permissions.clone(),
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    tracing::info!(user_id = %user.id, role = %role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
        permissions,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id.clone())
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        permissions: auth_user.permissions,
    }))
}

/// Insert or refresh the local copy of an identity-service user, keyed by username.
async fn upsert_user(
    db: &DatabaseConnection,
    external: &ExternalUser,
    role: Role,
) -> Result<user::Model, AppError> {
    let now = Utc::now();

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&external.username))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        return refresh_user(db, existing, external, role).await;
    }

    let txn = db.begin().await?;
    let id = next_id(&txn, prefix::USER).await?;
    let inserted = user::ActiveModel {
        id: Set(id),
        username: Set(external.username.clone()),
        name: Set(external.name.clone()),
        email: Set(external.email.clone()),
        nim: Set(external.nim.clone()),
        phone: Set(external.phone.clone()),
        faculty: Set(external.faculty.clone()),
        study_program: Set(external.study_program.clone()),
        role: Set(role),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await;

    match inserted {
        Ok(model) => {
            txn.commit().await?;
            tracing::info!(user_id = %model.id, username = %model.username, "Created local user");
            Ok(model)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // A concurrent login created the row first.
            txn.rollback().await?;
            let existing = user::Entity::find()
                .filter(user::Column::Username.eq(&external.username))
                .one(db)
                .await?
                .ok_or_else(|| AppError::Internal("user vanished after conflict".into()))?;
            refresh_user(db, existing, external, role).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn refresh_user(
    db: &DatabaseConnection,
    existing: user::Model,
    external: &ExternalUser,
    role: Role,
) -> Result<user::Model, AppError> {
    let now = Utc::now();
    let mut active: user::ActiveModel = existing.into();
    active.name = Set(external.name.clone());
    active.email = Set(external.email.clone());
    active.nim = Set(external.nim.clone());
    active.phone = Set(external.phone.clone());
    active.faculty = Set(external.faculty.clone());
    active.study_program = Set(external.study_program.clone());
    active.role = Set(role);
    active.last_login_at = Set(Some(now));
    active.updated_at = Set(now);
    Ok(active.update(db).await?)
}

pub async fn permissions_for(db: &DatabaseConnection, role: Role) -> Result<Vec<String>, DbErr> {
    let role_perms = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role.as_str()))
        .order_by_asc(role_permission::Column::Permission)
        .all(db)
        .await?;
    Ok(role_perms.into_iter().map(|rp| rp.permission).collect())
}
