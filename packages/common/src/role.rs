#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of internal roles.
///
/// External identity providers report free-form role strings; [`Role::from_external`]
/// maps them onto this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
    /// Student-affairs staff.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "student_affairs"))]
    StudentAffairs,
    /// Student executive board.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "bem"))]
    Bem,
    /// Student representative council.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "mpm"))]
    Mpm,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "student"))]
    Student,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Self::Admin,
        Self::StudentAffairs,
        Self::Bem,
        Self::Mpm,
        Self::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::StudentAffairs => "student_affairs",
            Self::Bem => "bem",
            Self::Mpm => "mpm",
            Self::Student => "student",
        }
    }

    /// Map a role string reported by the identity provider.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace,
    /// spaces and hyphens. Returns `None` for roles with no internal
    /// counterpart.
    pub fn from_external(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "admin" | "administrator" | "superadmin" | "super_admin" => Some(Self::Admin),
            "student_affairs" | "kemahasiswaan" | "staff" | "staf" | "staff_kemahasiswaan" => {
                Some(Self::StudentAffairs)
            }
            "bem" | "pengurus_bem" => Some(Self::Bem),
            "mpm" | "pengurus_mpm" => Some(Self::Mpm),
            "student" | "mahasiswa" | "user" => Some(Self::Student),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Invalid role '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_external_aliases() {
        assert_eq!(Role::from_external("Mahasiswa"), Some(Role::Student));
        assert_eq!(Role::from_external(" KEMAHASISWAAN "), Some(Role::StudentAffairs));
        assert_eq!(Role::from_external("Staff Kemahasiswaan"), Some(Role::StudentAffairs));
        assert_eq!(Role::from_external("super-admin"), Some(Role::Admin));
        assert_eq!(Role::from_external("BEM"), Some(Role::Bem));
        assert_eq!(Role::from_external("mpm"), Some(Role::Mpm));
    }

    #[test]
    fn unknown_roles_are_not_mapped() {
        assert_eq!(Role::from_external("dosen"), None);
        assert_eq!(Role::from_external(""), None);
    }

    #[test]
    fn parse_round_trips_internal_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert!("Admin".parse::<Role>().is_err());
    }
}
