//! PostgreSQL store
//!
//! Queries are runtime-checked (`sqlx::query_as` over the column constants)
//! so the crate builds without a live database. Relation embedding issues one
//! `= ANY($1)` follow-up query per requested relation inside the same adapter
//! call, which keeps a loader batch at a single store invocation.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::columns::{
    MEMBER_TYPE_COLUMNS, POST_COLUMNS, PROFILE_COLUMNS, PROFILE_WITH_MEMBER_TYPE_COLUMNS,
    SUBSCRIPTION_COLUMNS, USER_COLUMNS,
};
use super::{assemble_user_records, EdgeFilter, Filter, Store, StoreError, StoreResult};
use crate::models::{
    ChangePost, ChangeProfile, ChangeUser, CreatePost, CreateProfile, CreateUser, MemberType,
    MemberTypeId, Post, Profile, ProfileRecord, SubscriptionEdge, User, UserInclude, UserRecord,
};

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Profile row joined with its member type
#[derive(FromRow)]
struct ProfileJoinRow {
    id: Uuid,
    is_male: bool,
    year_of_birth: i32,
    user_id: Uuid,
    member_type_id: Option<MemberTypeId>,
    mt_discount: Option<f64>,
    mt_posts_limit_per_month: Option<i32>,
}

impl From<ProfileJoinRow> for ProfileRecord {
    fn from(row: ProfileJoinRow) -> Self {
        let member_type = match (row.member_type_id, row.mt_discount, row.mt_posts_limit_per_month)
        {
            (Some(id), Some(discount), Some(posts_limit_per_month)) => Some(MemberType {
                id,
                discount,
                posts_limit_per_month,
            }),
            _ => None,
        };
        Self {
            profile: Profile {
                id: row.id,
                is_male: row.is_male,
                year_of_birth: row.year_of_birth,
                user_id: row.user_id,
                member_type_id: row.member_type_id,
            },
            member_type,
        }
    }
}

/// Translate constraint failures into their store-level meaning
fn map_write_error(entity: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation {
                entity,
                detail: db.constraint().unwrap_or("unique key").to_string(),
            };
        }
        if db.is_foreign_key_violation() {
            let target = match db.constraint() {
                Some(name) if name.contains("member_type") => "member type",
                _ => "user",
            };
            return StoreError::ForeignKeyViolation { entity, target };
        }
    }
    StoreError::Database(err)
}

impl PgStore {
    /// Create a new PgStore over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn select_users(&self, filter: &Filter) -> StoreResult<Vec<User>> {
        let users = match filter {
            Filter::All => {
                let sql = format!("SELECT {} FROM users ORDER BY name ASC, id ASC", USER_COLUMNS);
                sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?
            }
            Filter::Ids(ids) => {
                let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
                sqlx::query_as::<_, User>(&sql)
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::Owners(_) => Vec::new(),
        };
        Ok(users)
    }

    async fn select_profiles(&self, filter: &Filter) -> StoreResult<Vec<ProfileRecord>> {
        let base = format!(
            "SELECT {} FROM profiles p LEFT JOIN member_types m ON m.id = p.member_type_id",
            PROFILE_WITH_MEMBER_TYPE_COLUMNS
        );
        let rows = match filter {
            Filter::All => {
                sqlx::query_as::<_, ProfileJoinRow>(&base)
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::Ids(ids) => {
                let sql = format!("{} WHERE p.id = ANY($1)", base);
                sqlx::query_as::<_, ProfileJoinRow>(&sql)
                    .bind(ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::Owners(user_ids) => {
                let sql = format!("{} WHERE p.user_id = ANY($1)", base);
                sqlx::query_as::<_, ProfileJoinRow>(&sql)
                    .bind(user_ids.as_slice())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(ProfileRecord::from).collect())
    }

    async fn select_posts(&self, filter: &Filter) -> StoreResult<Vec<Post>> {
        let (sql, ids) = match filter {
            Filter::All => (format!("SELECT {} FROM posts", POST_COLUMNS), None),
            Filter::Ids(ids) => (
                format!("SELECT {} FROM posts WHERE id = ANY($1)", POST_COLUMNS),
                Some(ids),
            ),
            Filter::Owners(ids) => (
                format!("SELECT {} FROM posts WHERE author_id = ANY($1)", POST_COLUMNS),
                Some(ids),
            ),
        };
        let query = sqlx::query_as::<_, Post>(&sql);
        let posts = match ids {
            Some(ids) => query.bind(ids.as_slice()).fetch_all(&self.pool).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(posts)
    }

    async fn select_edges(&self, filter: &EdgeFilter) -> StoreResult<Vec<SubscriptionEdge>> {
        let (sql, ids) = match filter {
            EdgeFilter::All => (
                format!(
                    "SELECT {} FROM subscribers_on_authors ORDER BY created_at ASC",
                    SUBSCRIPTION_COLUMNS
                ),
                None,
            ),
            EdgeFilter::Subscribers(ids) => (
                format!(
                    "SELECT {} FROM subscribers_on_authors WHERE subscriber_id = ANY($1) ORDER BY created_at ASC",
                    SUBSCRIPTION_COLUMNS
                ),
                Some(ids),
            ),
            EdgeFilter::Authors(ids) => (
                format!(
                    "SELECT {} FROM subscribers_on_authors WHERE author_id = ANY($1) ORDER BY created_at ASC",
                    SUBSCRIPTION_COLUMNS
                ),
                Some(ids),
            ),
        };
        let query = sqlx::query_as::<_, SubscriptionEdge>(&sql);
        let edges = match ids {
            Some(ids) => query.bind(ids.as_slice()).fetch_all(&self.pool).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(edges)
    }

    /// Edges touching any of `user_ids` in either direction
    async fn select_edges_touching(&self, user_ids: &[Uuid]) -> StoreResult<Vec<SubscriptionEdge>> {
        let sql = format!(
            "SELECT {} FROM subscribers_on_authors \
             WHERE subscriber_id = ANY($1) OR author_id = ANY($1) \
             ORDER BY created_at ASC",
            SUBSCRIPTION_COLUMNS
        );
        let edges = sqlx::query_as::<_, SubscriptionEdge>(&sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(edges)
    }

    async fn delete_by_id(&self, table: &'static str, entity: &'static str, id: Uuid) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_users(
        &self,
        filter: Filter,
        include: UserInclude,
    ) -> StoreResult<Vec<UserRecord>> {
        let users = self.select_users(&filter).await?;
        if users.is_empty() || include.is_empty() {
            return Ok(users.into_iter().map(UserRecord::bare).collect());
        }

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let profiles = if include.profile {
            self.select_profiles(&Filter::Owners(ids.clone())).await?
        } else {
            Vec::new()
        };
        let posts = if include.posts {
            self.select_posts(&Filter::Owners(ids.clone())).await?
        } else {
            Vec::new()
        };
        let edges = if include.subscriptions {
            self.select_edges_touching(&ids).await?
        } else {
            Vec::new()
        };

        Ok(assemble_user_records(users, include, profiles, posts, edges))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, balance) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.name)
            .bind(data.balance)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("user", e))
    }

    async fn update_user(&self, id: Uuid, data: ChangeUser) -> StoreResult<User> {
        let sql = format!(
            r#"UPDATE users
            SET name = COALESCE($2, name),
                balance = COALESCE($3, balance)
            WHERE id = $1
            RETURNING {}"#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(data.name)
            .bind(data.balance)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("user", e))?
            .ok_or_else(|| StoreError::not_found("user"))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id("users", "user", id).await
    }

    async fn find_profiles(&self, filter: Filter) -> StoreResult<Vec<ProfileRecord>> {
        self.select_profiles(&filter).await
    }

    async fn find_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn create_profile(&self, data: CreateProfile) -> StoreResult<Profile> {
        let sql = format!(
            r#"INSERT INTO profiles (id, is_male, year_of_birth, user_id, member_type_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}"#,
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.is_male)
            .bind(data.year_of_birth)
            .bind(data.user_id)
            .bind(data.member_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("profile", e))
    }

    async fn update_profile(&self, id: Uuid, data: ChangeProfile) -> StoreResult<Profile> {
        let sql = format!(
            r#"UPDATE profiles
            SET is_male = COALESCE($2, is_male),
                year_of_birth = COALESCE($3, year_of_birth),
                member_type_id = COALESCE($4, member_type_id)
            WHERE id = $1
            RETURNING {}"#,
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(data.is_male)
            .bind(data.year_of_birth)
            .bind(data.member_type_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("profile", e))?
            .ok_or_else(|| StoreError::not_found("profile"))
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id("profiles", "profile", id).await
    }

    async fn find_posts(&self, filter: Filter) -> StoreResult<Vec<Post>> {
        self.select_posts(&filter).await
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(&self, data: CreatePost) -> StoreResult<Post> {
        let sql = format!(
            "INSERT INTO posts (id, title, content, author_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.title)
            .bind(&data.content)
            .bind(data.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("post", e))
    }

    async fn update_post(&self, id: Uuid, data: ChangePost) -> StoreResult<Post> {
        let sql = format!(
            r#"UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content)
            WHERE id = $1
            RETURNING {}"#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(data.title)
            .bind(data.content)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("post", e))?
            .ok_or_else(|| StoreError::not_found("post"))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id("posts", "post", id).await
    }

    async fn find_member_types(
        &self,
        ids: Option<Vec<MemberTypeId>>,
    ) -> StoreResult<Vec<MemberType>> {
        let member_types = match ids {
            None => {
                let sql = format!("SELECT {} FROM member_types ORDER BY id", MEMBER_TYPE_COLUMNS);
                sqlx::query_as::<_, MemberType>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(ids) => {
                let sql = format!(
                    "SELECT {} FROM member_types WHERE id = ANY($1) ORDER BY id",
                    MEMBER_TYPE_COLUMNS
                );
                sqlx::query_as::<_, MemberType>(&sql)
                    .bind(ids)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(member_types)
    }

    async fn find_member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>> {
        let sql = format!("SELECT {} FROM member_types WHERE id = $1", MEMBER_TYPE_COLUMNS);
        let member_type = sqlx::query_as::<_, MemberType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member_type)
    }

    async fn find_subscriptions(&self, filter: EdgeFilter) -> StoreResult<Vec<SubscriptionEdge>> {
        self.select_edges(&filter).await
    }

    async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<Option<SubscriptionEdge>> {
        let sql = format!(
            "SELECT {} FROM subscribers_on_authors WHERE subscriber_id = $1 AND author_id = $2",
            SUBSCRIPTION_COLUMNS
        );
        let edge = sqlx::query_as::<_, SubscriptionEdge>(&sql)
            .bind(subscriber_id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(edge)
    }

    async fn create_subscription(
        &self,
        subscriber_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<SubscriptionEdge> {
        let sql = format!(
            "INSERT INTO subscribers_on_authors (subscriber_id, author_id) VALUES ($1, $2) RETURNING {}",
            SUBSCRIPTION_COLUMNS
        );
        sqlx::query_as::<_, SubscriptionEdge>(&sql)
            .bind(subscriber_id)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match map_write_error("subscription", e) {
                StoreError::UniqueViolation { entity, .. } => StoreError::UniqueViolation {
                    entity,
                    detail: format!("{} -> {}", subscriber_id, author_id),
                },
                other => other,
            })
    }

    async fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM subscribers_on_authors WHERE subscriber_id = $1 AND author_id = $2",
        )
        .bind(subscriber_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("subscription"));
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
