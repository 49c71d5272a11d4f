//! Database operations for the `raw_posts` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use buzzdb_core::NormalizedPost;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `raw_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawPostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub platform: String,
    pub post_id: String,
    pub company: String,
    pub full_text: String,
    pub language: Option<String>,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_description: Option<String>,
    pub author_followers_count: Option<i32>,
    pub author_following_count: Option<i32>,
    pub author_connections_count: Option<i32>,
    pub author_is_verified: bool,
    pub author_profile_url: Option<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub shares_count: i32,
    pub views_count: Option<i64>,
    pub post_url: Option<String>,
    pub is_reply: bool,
    pub conversation_id: Option<String>,
    /// JSON array of media URLs extracted from the platform payload.
    pub media_urls: Value,
    pub search_query: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub payload: Value,
    pub is_classified: bool,
}

impl RawPostRow {
    /// First image URL from `media_urls`, used as the classifier's optional
    /// image input.
    #[must_use]
    pub fn first_media_url(&self) -> Option<String> {
        self.media_urls
            .as_array()
            .and_then(|urls| urls.first())
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

const SELECT_COLUMNS: &str = "id, public_id, platform, post_id, company, full_text, language, \
     author_id, author_name, author_username, author_description, \
     author_followers_count, author_following_count, author_connections_count, \
     author_is_verified, author_profile_url, \
     likes_count, comments_count, shares_count, views_count, \
     post_url, is_reply, conversation_id, media_urls, search_query, \
     posted_at, scraped_at, payload, is_classified";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a raw post if its `(platform, post_id)` natural key is not yet
/// present.
///
/// Returns `Some(id)` for a fresh insert, `None` when the natural key
/// collided — the caller counts that as a skip, not an error. The uniqueness
/// constraint is what makes overlapping or concurrent runs safe.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any reason other than
/// the natural-key conflict.
pub async fn insert_raw_post(
    pool: &PgPool,
    post: &NormalizedPost,
    search_query: Option<&str>,
    company: &str,
) -> Result<Option<i64>, DbError> {
    let media_urls =
        serde_json::to_value(&post.media_urls).unwrap_or_else(|_| Value::Array(vec![]));

    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO raw_posts \
             (platform, post_id, company, full_text, language, \
              author_id, author_name, author_username, author_description, \
              author_followers_count, author_following_count, author_connections_count, \
              author_is_verified, author_profile_url, \
              likes_count, comments_count, shares_count, views_count, \
              post_url, is_reply, conversation_id, media_urls, search_query, \
              posted_at, payload) \
         VALUES ($1, $2, $3, $4, $5, \
                 $6, $7, $8, $9, \
                 $10, $11, $12, \
                 $13, $14, \
                 $15, $16, $17, $18, \
                 $19, $20, $21, $22, $23, \
                 $24, $25) \
         ON CONFLICT (platform, post_id) DO NOTHING \
         RETURNING id",
    )
    .bind(post.platform.as_str())
    .bind(&post.post_id)
    .bind(company)
    .bind(&post.full_text)
    .bind(&post.language)
    .bind(&post.author.author_id)
    .bind(&post.author.name)
    .bind(&post.author.username)
    .bind(&post.author.description)
    .bind(post.author.followers_count)
    .bind(post.author.following_count)
    .bind(post.author.connections_count)
    .bind(post.author.is_verified)
    .bind(&post.author.profile_url)
    .bind(post.metrics.likes)
    .bind(post.metrics.comments)
    .bind(post.metrics.shares)
    .bind(post.metrics.views)
    .bind(&post.post_url)
    .bind(post.is_reply)
    .bind(&post.conversation_id)
    .bind(media_urls)
    .bind(search_query)
    .bind(post.posted_at)
    .bind(&post.payload)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns `true` if a post with this natural key is already stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn raw_post_exists(
    pool: &PgPool,
    platform: &str,
    post_id: &str,
) -> Result<bool, DbError> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM raw_posts WHERE platform = $1 AND post_id = $2",
    )
    .bind(platform)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// Returns posts not yet classified, newest scrape first, optionally filtered
/// by platform and company.
///
/// This query is the classification pipeline's natural retry mechanism: a
/// post whose classifier call failed keeps `is_classified = false` and shows
/// up again on the next invocation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_unclassified_posts(
    pool: &PgPool,
    platform: Option<&str>,
    company: Option<&str>,
    limit: i64,
) -> Result<Vec<RawPostRow>, DbError> {
    let rows = sqlx::query_as::<_, RawPostRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM raw_posts \
         WHERE is_classified = FALSE \
           AND ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR company = $2) \
         ORDER BY scraped_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(platform)
    .bind(company)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single raw post by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_raw_post(pool: &PgPool, id: i64) -> Result<RawPostRow, DbError> {
    let row = sqlx::query_as::<_, RawPostRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM raw_posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
