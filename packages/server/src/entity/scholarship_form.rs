use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scholarship_form")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub scholarship_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_active: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scholarship::Entity",
        from = "Column::ScholarshipId",
        to = "super::scholarship::Column::Id"
    )]
    Scholarship,
    #[sea_orm(has_many = "super::form_field::Entity")]
    Fields,
    #[sea_orm(has_one = "super::form_setting::Entity")]
    Setting,
    #[sea_orm(has_many = "super::form_submission::Entity")]
    Submissions,
}

impl Related<super::scholarship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scholarship.def()
    }
}

impl Related<super::form_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::form_setting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Setting.def()
    }
}

impl Related<super::form_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
