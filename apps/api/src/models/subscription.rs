//! Subscription edge model
//!
//! An edge records that `subscriber_id` follows `author_id`. The pair is
//! unique; self-edges are allowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Edge record from the subscribers_on_authors table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SubscriptionEdge {
    pub subscriber_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionEdge {
    pub fn key(&self) -> (Uuid, Uuid) {
        (self.subscriber_id, self.author_id)
    }
}
