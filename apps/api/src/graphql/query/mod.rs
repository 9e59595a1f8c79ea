//! GraphQL queries for membergraph
//!
//! This module contains all query resolvers, organized by domain. Root list
//! fields read whole tables through the request's loaders; single-entity
//! fields resolve to null when the row does not exist.

mod member_type;
mod post;
mod profile;
mod subscription;
mod user;

pub use member_type::MemberTypeQuery;
pub use post::PostQuery;
pub use profile::ProfileQuery;
pub use subscription::SubscriptionQuery;
pub use user::UserQuery;

use std::sync::Arc;

use async_graphql::{Context, MergedObject, Result};

use crate::config::ListFieldFallback;
use crate::error::to_graphql_error;
use crate::graphql::loaders::LoadResult;

/// Root query type combining all query domains
#[derive(MergedObject, Default)]
#[graphql(name = "RootQueryType")]
pub struct Query(
    MemberTypeQuery,
    UserQuery,
    PostQuery,
    ProfileQuery,
    SubscriptionQuery,
);

/// Shape a whole-table read into a root list field answer
///
/// With [`ListFieldFallback::Empty`] in the schema data, a failed read is
/// logged and answered with an empty list; loaders still report the error
/// to every other caller.
fn root_list<T, U>(ctx: &Context<'_>, field: &'static str, rows: LoadResult<Arc<[T]>>) -> Result<Vec<U>>
where
    T: Clone,
    U: From<T>,
{
    match rows {
        Ok(rows) => Ok(rows.iter().cloned().map(U::from).collect()),
        Err(err) => match ctx.data_opt::<ListFieldFallback>().copied().unwrap_or_default() {
            ListFieldFallback::Empty => {
                tracing::warn!(field, error = %err, "Root list read failed, answering empty list");
                Ok(Vec::new())
            }
            ListFieldFallback::Error => Err(to_graphql_error(err)),
        },
    }
}
