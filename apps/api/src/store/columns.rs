// ============================================================================
// SQL Column Constants
//
// SELECT column lists shared by the PostgreSQL store queries.
// ============================================================================

/// SQL columns for user queries
pub const USER_COLUMNS: &str = "id, name, balance";

/// SQL columns for profile queries
pub const PROFILE_COLUMNS: &str = "id, is_male, year_of_birth, user_id, member_type_id";

/// Profile columns joined with the member type, prefixed `mt_`
pub const PROFILE_WITH_MEMBER_TYPE_COLUMNS: &str = r#"
    p.id, p.is_male, p.year_of_birth, p.user_id, p.member_type_id,
    m.discount AS mt_discount,
    m.posts_limit_per_month AS mt_posts_limit_per_month
"#;

/// SQL columns for post queries
pub const POST_COLUMNS: &str = "id, title, content, author_id";

/// SQL columns for member type queries
pub const MEMBER_TYPE_COLUMNS: &str = "id, discount, posts_limit_per_month";

/// SQL columns for subscription edge queries
pub const SUBSCRIPTION_COLUMNS: &str = "subscriber_id, author_id, created_at";
