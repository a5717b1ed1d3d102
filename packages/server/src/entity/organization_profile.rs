use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organization_profile")]
pub struct Model {
    /// `bem` or `mpm`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub vision: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mission: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
