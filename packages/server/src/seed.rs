use common::{OrganizationKind, Role};
use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict};
use sea_orm::*;
use tracing::info;

use crate::entity::{form_field, form_submission, organization_profile, role, role_permission};

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(Role, &str)] = &[
    // Admin: everything
    (Role::Admin, "content:manage"),
    (Role::Admin, "scholarship:manage"),
    (Role::Admin, "form:manage"),
    (Role::Admin, "submission:view_all"),
    (Role::Admin, "counseling:manage"),
    (Role::Admin, "aspiration:manage"),
    (Role::Admin, "organization:edit:bem"),
    (Role::Admin, "organization:edit:mpm"),
    (Role::Admin, "chatbot:manage"),
    // Student affairs staff
    (Role::StudentAffairs, "content:manage"),
    (Role::StudentAffairs, "scholarship:manage"),
    (Role::StudentAffairs, "form:manage"),
    (Role::StudentAffairs, "submission:view_all"),
    (Role::StudentAffairs, "counseling:manage"),
    (Role::StudentAffairs, "aspiration:manage"),
    // Student organizations
    (Role::Bem, "organization:edit:bem"),
    (Role::Mpm, "organization:edit:mpm"),
    // Students
    (Role::Student, "submission:submit"),
    (Role::Student, "counseling:book"),
    (Role::Student, "aspiration:submit"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u64;
    for r in Role::ALL {
        let model = role::ActiveModel {
            name: Set(r.as_str().to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => roles_inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u64;
    for &(r, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(r.as_str().to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => perms_inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Make sure both organization profiles exist so they can be read and edited.
pub async fn seed_organization_profiles(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (kind, name) in [
        (OrganizationKind::Bem, "Badan Eksekutif Mahasiswa"),
        (OrganizationKind::Mpm, "Majelis Permusyawaratan Mahasiswa"),
    ] {
        let model = organization_profile::ActiveModel {
            kind: Set(kind.as_str().to_string()),
            name: Set(name.to_string()),
            vision: Set(None),
            mission: Set(None),
            description: Set(None),
            updated_at: Set(chrono::Utc::now()),
        };

        let result = organization_profile::Entity::insert(model)
            .on_conflict(
                OnConflict::column(organization_profile::Column::Kind)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Ensure required database indexes exist.
///
/// Entity-driven table creation only covers single-column uniqueness, so the
/// composite indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Field keys are unique within a form.
    create_index(
        db,
        "idx_form_field_form_key",
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_form_field_form_key")
            .table(form_field::Entity)
            .col(form_field::Column::FormId)
            .col(form_field::Column::Key)
            .to_owned(),
    )
    .await?;

    // Quota and one-per-user checks:
    // SELECT COUNT(*) FROM form_submission WHERE form_id = ? [AND user_id = ?]
    create_index(
        db,
        "idx_form_submission_form_user",
        Index::create()
            .if_not_exists()
            .name("idx_form_submission_form_user")
            .table(form_submission::Entity)
            .col(form_submission::Column::FormId)
            .col(form_submission::Column::UserId)
            .to_owned(),
    )
    .await?;

    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    name: &str,
    stmt: IndexCreateStatement,
) -> Result<(), DbErr> {
    let stmt = db.get_database_backend().build(&stmt);
    match db.execute(stmt).await {
        Ok(_) => {
            info!("Ensured index {} exists", name);
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Failed to create index {}: {}", name, e);
            Ok(())
        }
    }
}
