#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};

/// Lifecycle of a counseling booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum CounselingStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "approved"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
}

impl CounselingStatus {
    /// Allowed staff transitions: pending → approved | rejected, approved → completed.
    pub fn can_transition_to(&self, next: CounselingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Completed)
        )
    }
}

/// Lifecycle of a student aspiration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum AspirationStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "in_review"))]
    InReview,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "responded"))]
    Responded,
}

/// Which student organization a profile belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bem"))]
    Bem,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "mpm"))]
    Mpm,
}

impl OrganizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bem => "bem",
            Self::Mpm => "mpm",
        }
    }

    /// The permission required to edit this organization's profile.
    pub fn edit_permission(&self) -> &'static str {
        match self {
            Self::Bem => "organization:edit:bem",
            Self::Mpm => "organization:edit:mpm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counseling_transitions() {
        use CounselingStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Completed.can_transition_to(Pending));
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&AspirationStatus::InReview).unwrap(),
            "\"in_review\""
        );
        assert_eq!(
            serde_json::to_string(&OrganizationKind::Bem).unwrap(),
            "\"bem\""
        );
    }
}
