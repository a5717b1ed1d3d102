use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, Schema,
};
use tracing::info;

use crate::entity::*;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    if db.get_database_backend() == DatabaseBackend::Sqlite {
        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
    }

    create_tables(&db).await?;
    Ok(db)
}

/// Create every table that does not exist yet, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create(db, role::Entity).await?;
    create(db, role_permission::Entity).await?;
    create(db, id_sequence::Entity).await?;
    create(db, user::Entity).await?;
    create(db, scholarship::Entity).await?;
    create(db, scholarship_form::Entity).await?;
    create(db, form_field::Entity).await?;
    create(db, form_setting::Entity).await?;
    create(db, form_submission::Entity).await?;
    create(db, news_category::Entity).await?;
    create(db, news::Entity).await?;
    create(db, announcement::Entity).await?;
    create(db, achievement::Entity).await?;
    create(db, download::Entity).await?;
    create(db, carousel_slide::Entity).await?;
    create(db, director::Entity).await?;
    create(db, organization_profile::Entity).await?;
    create(db, counseling_booking::Entity).await?;
    create(db, aspiration::Entity).await?;
    create(db, chatbot_rule::Entity).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(schema.create_table_from_entity(entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}
