use common::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    /// Student number.
    pub nim: Option<String>,
    pub phone: Option<String>,
    pub faculty: Option<String>,
    pub study_program: Option<String>,
    pub role: Role,

    pub last_login_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_submission::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::counseling_booking::Entity")]
    CounselingBookings,
    #[sea_orm(has_many = "super::aspiration::Entity")]
    Aspirations,
}

impl Related<super::form_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::counseling_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CounselingBookings.def()
    }
}

impl Related<super::aspiration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Aspirations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
