//! Profile model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{MemberType, MemberTypeId};

/// Profile record from the profiles table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Profile {
    pub id: Uuid,

    pub is_male: bool,

    pub year_of_birth: i32,

    /// Owning user; unique, so a user has at most one profile
    pub user_id: Uuid,

    pub member_type_id: Option<MemberTypeId>,
}

/// A profile with its member type embedded
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub profile: Profile,
    pub member_type: Option<MemberType>,
}

/// Profile creation input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfile {
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: Uuid,
    pub member_type_id: MemberTypeId,
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeProfile {
    pub is_male: Option<bool>,
    pub year_of_birth: Option<i32>,
    pub member_type_id: Option<MemberTypeId>,
}
