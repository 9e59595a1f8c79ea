//! Member type GraphQL types
//!
//! `MemberTypeId` is a GraphQL enum, so an unknown id is rejected during
//! argument validation before any resolver runs.

use async_graphql::{Enum, Object};

use crate::models::{MemberType as DbMemberType, MemberTypeId as DbMemberTypeId};

/// Member type identifier enum for GraphQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum MemberTypeId {
    /// Entry-level membership
    Basic,
    /// Business membership
    Business,
}

impl From<DbMemberTypeId> for MemberTypeId {
    fn from(id: DbMemberTypeId) -> Self {
        match id {
            DbMemberTypeId::Basic => Self::Basic,
            DbMemberTypeId::Business => Self::Business,
        }
    }
}

impl From<MemberTypeId> for DbMemberTypeId {
    fn from(id: MemberTypeId) -> Self {
        match id {
            MemberTypeId::Basic => Self::Basic,
            MemberTypeId::Business => Self::Business,
        }
    }
}

/// Membership tier exposed via GraphQL
pub struct MemberType {
    inner: DbMemberType,
}

impl MemberType {
    pub fn new(member_type: DbMemberType) -> Self {
        Self { inner: member_type }
    }
}

impl From<DbMemberType> for MemberType {
    fn from(member_type: DbMemberType) -> Self {
        Self::new(member_type)
    }
}

#[Object]
impl MemberType {
    async fn id(&self) -> MemberTypeId {
        self.inner.id.into()
    }

    /// Discount percentage granted to members
    async fn discount(&self) -> f64 {
        self.inner.discount
    }

    async fn posts_limit_per_month(&self) -> i32 {
        self.inner.posts_limit_per_month
    }
}
