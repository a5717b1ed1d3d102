use common::form::{FieldSpec, FieldType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_field")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub form_id: String,
    pub section_index: i32,
    pub section_title: Option<String>,
    pub field_index: i32,
    /// Stable key used in submission data. Unique within the form.
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    /// Dropdown choices as a JSON array of strings.
    pub options: Json,
    pub required: bool,
    pub is_active: bool,
}

impl Model {
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn to_spec(&self) -> FieldSpec {
        FieldSpec {
            key: self.key.clone(),
            label: self.label.clone(),
            field_type: self.field_type,
            required: self.required,
            options: self.option_list(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scholarship_form::Entity",
        from = "Column::FormId",
        to = "super::scholarship_form::Column::Id"
    )]
    Form,
}

impl Related<super::scholarship_form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Form.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
