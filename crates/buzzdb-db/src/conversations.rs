//! Database operations for the `conversations` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and insert types
// ---------------------------------------------------------------------------

/// A row from the `conversations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationRow {
    pub id: i64,
    pub conversation_id: String,
    pub source: String,
    pub main_post_id: String,
    pub thread: Value,
    pub reply_count: i32,
    pub search_query: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a conversation thread.
#[derive(Debug, Clone)]
pub struct NewConversation<'a> {
    pub conversation_id: &'a str,
    pub source: &'a str,
    pub main_post_id: &'a str,
    pub thread: &'a Value,
    pub reply_count: i32,
    pub search_query: Option<&'a str>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_reply_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns `true` if a conversation with this id is already stored.
///
/// The ingestion pipeline calls this BEFORE issuing the expensive
/// full-thread fetch, so high-overlap windows do not waste API calls.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn conversation_exists(pool: &PgPool, conversation_id: &str) -> Result<bool, DbError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM conversations WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// Inserts a conversation if its id is not yet present.
///
/// Returns `Some(id)` for a fresh insert, `None` on an id collision (counted
/// as a skip by the caller).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any reason other than
/// the id conflict.
pub async fn insert_conversation(
    pool: &PgPool,
    conversation: &NewConversation<'_>,
) -> Result<Option<i64>, DbError> {
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO conversations \
             (conversation_id, source, main_post_id, thread, reply_count, \
              search_query, started_at, last_reply_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (conversation_id) DO NOTHING \
         RETURNING id",
    )
    .bind(conversation.conversation_id)
    .bind(conversation.source)
    .bind(conversation.main_post_id)
    .bind(conversation.thread)
    .bind(conversation.reply_count)
    .bind(conversation.search_query)
    .bind(conversation.started_at)
    .bind(conversation.last_reply_at)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}
