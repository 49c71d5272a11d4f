//! Database operations for the `scraper_checkpoints` table.
//!
//! One row per `(source, search_query)` pair. `advance_checkpoint` is only
//! called after a window has been fully fetched and persisted; ordering the
//! advance strictly after the persist is what makes a crash mid-window safe
//! (the window is re-fetched and deduped, never silently skipped).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `scraper_checkpoints` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckpointRow {
    pub id: i64,
    pub source: String,
    pub search_query: String,
    pub last_window_start: Option<DateTime<Utc>>,
    pub last_window_end: Option<DateTime<Utc>>,
    /// Successfully processed windows.
    pub run_count: i32,
    /// Run attempts, including ones that failed before the advance.
    pub attempt_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetches the checkpoint row for a `(source, query)` pair, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_checkpoint(
    pool: &PgPool,
    source: &str,
    search_query: &str,
) -> Result<Option<CheckpointRow>, DbError> {
    let row = sqlx::query_as::<_, CheckpointRow>(
        "SELECT id, source, search_query, last_window_start, last_window_end, \
                run_count, attempt_count, created_at, updated_at \
         FROM scraper_checkpoints \
         WHERE source = $1 AND search_query = $2",
    )
    .bind(source)
    .bind(search_query)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the recorded `last_window_end` for a `(source, query)` pair —
/// the start of the next window — or `None` when no checkpoint exists yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_window_start(
    pool: &PgPool,
    source: &str,
    search_query: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let end: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
        "SELECT last_window_end FROM scraper_checkpoints \
         WHERE source = $1 AND search_query = $2",
    )
    .bind(source)
    .bind(search_query)
    .fetch_optional(pool)
    .await?;

    Ok(end.flatten())
}

/// Records one run attempt for a `(source, query)` pair, creating the
/// checkpoint row if it does not exist yet.
///
/// Attempts are tracked separately from `run_count` so a window that is
/// retried after a failure does not inflate the success counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn record_attempt(
    pool: &PgPool,
    source: &str,
    search_query: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scraper_checkpoints (source, search_query, attempt_count) \
         VALUES ($1, $2, 1) \
         ON CONFLICT (source, search_query) DO UPDATE SET \
             attempt_count = scraper_checkpoints.attempt_count + 1, \
             updated_at    = NOW()",
    )
    .bind(source)
    .bind(search_query)
    .execute(pool)
    .await?;

    Ok(())
}

/// Advances the checkpoint to a fully processed window and increments
/// `run_count`.
///
/// `last_window_end` is monotonically non-decreasing: `GREATEST` guards
/// against an out-of-order advance ever rewinding the position.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn advance_checkpoint(
    pool: &PgPool,
    source: &str,
    search_query: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scraper_checkpoints \
             (source, search_query, last_window_start, last_window_end, run_count) \
         VALUES ($1, $2, $3, $4, 1) \
         ON CONFLICT (source, search_query) DO UPDATE SET \
             last_window_start = EXCLUDED.last_window_start, \
             last_window_end   = GREATEST( \
                 COALESCE(scraper_checkpoints.last_window_end, EXCLUDED.last_window_end), \
                 EXCLUDED.last_window_end), \
             run_count         = scraper_checkpoints.run_count + 1, \
             updated_at        = NOW()",
    )
    .bind(source)
    .bind(search_query)
    .bind(window_start)
    .bind(window_end)
    .execute(pool)
    .await?;

    Ok(())
}
