use common::form::FormPolicy;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub form_id: String,

    pub accept_responses: bool,
    pub one_submission_per_email: bool,
    pub allow_edit: bool,
    pub submission_start: Option<DateTimeUtc>,
    pub submission_deadline: Option<DateTimeUtc>,
    pub max_submissions: Option<i32>,

    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Combine with the form's active flag into the gate policy.
    pub fn policy(&self, is_active: bool) -> FormPolicy {
        FormPolicy {
            is_active,
            accept_responses: self.accept_responses,
            submission_start: self.submission_start,
            submission_deadline: self.submission_deadline,
            max_submissions: self.max_submissions.map(|m| m.max(0) as u32),
            one_submission_per_email: self.one_submission_per_email,
            allow_edit: self.allow_edit,
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
