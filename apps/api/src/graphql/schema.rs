//! GraphQL schema builder for membergraph
//!
//! The schema carries no per-request state: the store and the loaders are
//! attached to each request by the HTTP handler.

use async_graphql::{EmptySubscription, Schema};

use crate::config::{Config, ListFieldFallback};

use super::mutation::Mutation;
use super::query::Query;

/// The membergraph GraphQL schema type
pub type MembergraphSchema = Schema<Query, Mutation, EmptySubscription>;

/// Default maximum selection depth
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Builder for constructing the GraphQL schema
pub struct SchemaBuilder {
    max_depth: usize,
    list_field_fallback: ListFieldFallback,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            list_field_fallback: ListFieldFallback::default(),
        }
    }

    /// Set the maximum selection depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set how root list fields answer a failed table read
    pub fn list_field_fallback(mut self, fallback: ListFieldFallback) -> Self {
        self.list_field_fallback = fallback;
        self
    }

    /// Build the schema
    pub fn build(self) -> MembergraphSchema {
        Schema::build(Query::default(), Mutation::default(), EmptySubscription)
            .limit_depth(self.max_depth)
            .data(self.list_field_fallback)
            .finish()
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the GraphQL schema from service configuration
pub fn build_schema(config: &Config) -> MembergraphSchema {
    SchemaBuilder::new()
        .max_depth(config.max_query_depth)
        .list_field_fallback(config.list_field_fallback)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_default() {
        let builder = SchemaBuilder::default();
        assert_eq!(builder.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(builder.list_field_fallback, ListFieldFallback::Error);
    }

    #[test]
    fn test_sdl_uses_root_type_names() {
        let sdl = SchemaBuilder::new().build().sdl();
        assert!(sdl.contains("type RootQueryType"));
        assert!(sdl.contains("type Mutations"));
        assert!(sdl.contains("enum MemberTypeId"));
        assert!(sdl.contains("type SubscriptionEdge"));
    }
}
