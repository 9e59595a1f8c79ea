//! Member type model
//!
//! Member types are a fixed catalogue keyed by [`MemberTypeId`]; the id is
//! the primary key, not a generated value.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Member type identifier matching the PostgreSQL member_type_id enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_type_id", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberTypeId {
    Basic,
    Business,
}

impl MemberTypeId {
    /// Every member type, in catalogue order
    pub const ALL: [MemberTypeId; 2] = [MemberTypeId::Basic, MemberTypeId::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Business => "BUSINESS",
        }
    }
}

impl std::fmt::Display for MemberTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member type record from the member_types table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MemberType {
    pub id: MemberTypeId,

    /// Discount percentage granted to members of this type
    pub discount: f64,

    pub posts_limit_per_month: i32,
}

impl MemberType {
    /// The seeded catalogue row for `id`
    pub fn seeded(id: MemberTypeId) -> Self {
        match id {
            MemberTypeId::Basic => Self {
                id,
                discount: 2.3,
                posts_limit_per_month: 20,
            },
            MemberTypeId::Business => Self {
                id,
                discount: 7.7,
                posts_limit_per_month: 100,
            },
        }
    }
}
