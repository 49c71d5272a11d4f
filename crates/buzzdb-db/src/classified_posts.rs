//! Database operations for the `classified_posts` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use buzzdb_core::{Category, Priority};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and insert types
// ---------------------------------------------------------------------------

/// A row from the `classified_posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassifiedPostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub raw_post_id: i64,
    pub company: String,
    pub platform: String,
    pub post_id: String,
    pub post_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
    pub author_username: Option<String>,
    pub author_followers_count: Option<i32>,
    pub is_spam: bool,
    pub spam_reason: Option<String>,
    /// `None` for spam posts — spam is a flag, not a category.
    pub category: Option<String>,
    pub product: Option<String>,
    pub sentiment_score: Option<i16>,
    pub urgency_score: Option<i16>,
    pub impact_score: Option<i16>,
    pub summary: Option<String>,
    pub key_issues: Value,
    pub suggested_action: Option<String>,
    pub priority: String,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
    pub status: String,
    pub raised_on_slack: bool,
    pub slack_channel: Option<String>,
    pub slack_message_ts: Option<String>,
    pub slack_raised_at: Option<DateTime<Utc>>,
    pub slack_raised_by: Option<String>,
    pub ticket_created: bool,
    pub ticket_id: Option<String>,
    pub ticket_url: Option<String>,
    pub ticket_system: Option<String>,
    pub ticket_created_at: Option<DateTime<Utc>>,
    pub assigned_team: Option<String>,
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub internal_notes: Option<String>,
    pub classified_at: DateTime<Utc>,
}

/// Insert payload produced by the classification pipeline for one raw post.
#[derive(Debug, Clone)]
pub struct NewClassification {
    pub is_spam: bool,
    pub spam_reason: Option<String>,
    pub category: Option<Category>,
    pub product: Option<String>,
    pub sentiment_score: Option<i16>,
    pub urgency_score: Option<i16>,
    pub impact_score: Option<i16>,
    pub summary: Option<String>,
    pub key_issues: Vec<String>,
    pub suggested_action: Option<String>,
    pub priority: Priority,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

const SELECT_COLUMNS: &str = "id, public_id, raw_post_id, company, platform, post_id, post_url, \
     posted_at, author_name, author_username, author_followers_count, \
     is_spam, spam_reason, category, product, \
     sentiment_score, urgency_score, impact_score, \
     summary, key_issues, suggested_action, priority, \
     prompt_tokens, completion_tokens, total_tokens, \
     status, raised_on_slack, slack_channel, slack_message_ts, slack_raised_at, \
     slack_raised_by, ticket_created, ticket_id, ticket_url, ticket_system, \
     ticket_created_at, assigned_team, assigned_to, resolution, resolved_at, \
     internal_notes, classified_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Persists a classification and flips the raw post's `is_classified` flag
/// in one transaction.
///
/// Denormalizes the raw post's display fields into the new row so dashboard
/// reads need no join. The `UNIQUE (raw_post_id)` constraint enforces the
/// one-judgment-per-post invariant; the paired flag update is restricted to
/// `is_classified = FALSE` so the false→true transition happens exactly once.
///
/// Returns the new classified post id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the raw post does not exist or was
/// already classified, or [`DbError::Sqlx`] if any statement fails.
pub async fn save_classification(
    pool: &PgPool,
    raw_post_id: i64,
    classification: &NewClassification,
) -> Result<i64, DbError> {
    let key_issues = serde_json::to_value(&classification.key_issues)
        .unwrap_or_else(|_| Value::Array(vec![]));

    let mut tx = pool.begin().await?;

    let flipped = sqlx::query(
        "UPDATE raw_posts SET is_classified = TRUE \
         WHERE id = $1 AND is_classified = FALSE",
    )
    .bind(raw_post_id)
    .execute(&mut *tx)
    .await?;

    if flipped.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO classified_posts \
             (raw_post_id, company, platform, post_id, post_url, posted_at, \
              author_name, author_username, author_followers_count, \
              is_spam, spam_reason, category, product, \
              sentiment_score, urgency_score, impact_score, \
              summary, key_issues, suggested_action, priority, \
              prompt_tokens, completion_tokens, total_tokens) \
         SELECT r.id, r.company, r.platform, r.post_id, r.post_url, r.posted_at, \
                r.author_name, r.author_username, r.author_followers_count, \
                $2, $3, $4, $5, \
                $6, $7, $8, \
                $9, $10, $11, $12, \
                $13, $14, $15 \
         FROM raw_posts r WHERE r.id = $1 \
         RETURNING id",
    )
    .bind(raw_post_id)
    .bind(classification.is_spam)
    .bind(&classification.spam_reason)
    .bind(classification.category.map(Category::as_str))
    .bind(&classification.product)
    .bind(classification.sentiment_score)
    .bind(classification.urgency_score)
    .bind(classification.impact_score)
    .bind(&classification.summary)
    .bind(key_issues)
    .bind(&classification.suggested_action)
    .bind(classification.priority.as_str())
    .bind(classification.prompt_tokens)
    .bind(classification.completion_tokens)
    .bind(classification.total_tokens)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(id)
}

/// Fetches a single classified post by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_classified_post(pool: &PgPool, id: i64) -> Result<ClassifiedPostRow, DbError> {
    let row = sqlx::query_as::<_, ClassifiedPostRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM classified_posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns non-spam posts needing attention, ordered by urgency then impact.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_actionable_posts(
    pool: &PgPool,
    min_urgency: i16,
    status: Option<&str>,
    company: Option<&str>,
    limit: i64,
) -> Result<Vec<ClassifiedPostRow>, DbError> {
    let rows = sqlx::query_as::<_, ClassifiedPostRow>(&format!(
        "SELECT {SELECT_COLUMNS} \
         FROM classified_posts \
         WHERE is_spam = FALSE \
           AND urgency_score >= $1 \
           AND ($2::TEXT IS NULL OR status = $2) \
           AND ($3::TEXT IS NULL OR company = $3) \
         ORDER BY urgency_score DESC, impact_score DESC, id DESC \
         LIMIT $4"
    ))
    .bind(min_urgency)
    .bind(status)
    .bind(company)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
