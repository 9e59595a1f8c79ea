//! GraphQL schema and resolvers for membergraph
//!
//! This module contains the async-graphql schema including:
//! - Query and mutation resolvers over users, profiles, posts and member types
//! - Per-request loaders that batch and cache store reads
//! - The preload policy deciding when a request reads whole tables up front

pub mod context;
pub mod loaders;
pub mod mutation;
pub mod preload;
pub mod query;
pub mod schema;
pub mod types;

pub use context::{request, RequestContext};
pub use loaders::{LoaderOptions, Loaders};
pub use preload::PreloadPolicy;
pub use schema::{build_schema, MembergraphSchema, SchemaBuilder};
