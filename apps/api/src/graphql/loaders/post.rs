//! Post DataLoader for batched fetching
//!
//! Serves two key kinds from one loader: posts by id, and the full post
//! list of an author ([`PostsByAuthor`]).

use async_graphql::dataloader::Loader;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::Tables;
use crate::models::Post;
use crate::store::{Filter, Store, StoreError};

/// Key for the posts written by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostsByAuthor(pub Uuid);

/// DataLoader for batching post queries
pub struct PostLoader {
    store: Arc<dyn Store>,
    tables: Arc<Tables>,
}

impl PostLoader {
    pub(crate) fn new(store: Arc<dyn Store>, tables: Arc<Tables>) -> Self {
        Self { store, tables }
    }
}

impl Loader<Uuid> for PostLoader {
    type Value = Post;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let posts: Vec<Post> = match self.tables.preloaded_posts() {
            Some(posts) => {
                let wanted: HashSet<&Uuid> = keys.iter().collect();
                posts.iter().filter(|p| wanted.contains(&p.id)).cloned().collect()
            }
            None => {
                tracing::debug!(kind = "posts", keys = keys.len(), "Loading batch");
                self.store
                    .find_posts(Filter::Ids(keys.to_vec()))
                    .await
                    .map_err(Arc::new)?
            }
        };

        Ok(posts.into_iter().map(|p| (p.id, p)).collect())
    }
}

impl Loader<PostsByAuthor> for PostLoader {
    type Value = Vec<Post>;
    type Error = Arc<StoreError>;

    async fn load(
        &self,
        keys: &[PostsByAuthor],
    ) -> Result<HashMap<PostsByAuthor, Self::Value>, Self::Error> {
        let author_ids: Vec<Uuid> = keys.iter().map(|k| k.0).collect();

        let posts: Vec<Post> = match self.tables.preloaded_posts() {
            Some(posts) => {
                let wanted: HashSet<&Uuid> = author_ids.iter().collect();
                posts
                    .iter()
                    .filter(|p| wanted.contains(&p.author_id))
                    .cloned()
                    .collect()
            }
            None => {
                tracing::debug!(kind = "posts_by_author", keys = keys.len(), "Loading batch");
                self.store
                    .find_posts(Filter::Owners(author_ids))
                    .await
                    .map_err(Arc::new)?
            }
        };

        // Group posts by author
        let mut result: HashMap<PostsByAuthor, Vec<Post>> = HashMap::new();
        for post in posts {
            result.entry(PostsByAuthor(post.author_id)).or_default().push(post);
        }

        // Ensure all requested keys have an entry (even if empty)
        for key in keys {
            result.entry(*key).or_default();
        }

        Ok(result)
    }
}
