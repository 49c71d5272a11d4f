//! Workflow transitions on classified posts.
//!
//! Every transition is an idempotent field overwrite plus a guarded status
//! advance: the proposed status is merged through
//! [`WorkflowStatus::advance`], so re-applying a transition overwrites its
//! fields but status never moves backward — assigning an already-resolved
//! post leaves it resolved.

use chrono::Utc;
use sqlx::PgPool;

use buzzdb_core::WorkflowStatus;

use crate::DbError;

/// Reads the current workflow status of a classified post.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::InvalidWorkflowStatus`] if the stored value is not a known
/// status.
async fn fetch_status(pool: &PgPool, id: i64) -> Result<WorkflowStatus, DbError> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT status FROM classified_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let value = value.ok_or(DbError::NotFound)?;
    value
        .parse()
        .map_err(|_| DbError::InvalidWorkflowStatus { id, value })
}

/// Marks a post as raised on a Slack channel; proposes `acknowledged`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_raised_on_slack(
    pool: &PgPool,
    id: i64,
    channel: &str,
    message_ts: Option<&str>,
    raised_by: Option<&str>,
) -> Result<(), DbError> {
    let status = fetch_status(pool, id)
        .await?
        .advance(WorkflowStatus::Acknowledged);

    sqlx::query(
        "UPDATE classified_posts \
         SET raised_on_slack = TRUE, \
             slack_channel   = $2, \
             slack_message_ts = $3, \
             slack_raised_at = NOW(), \
             slack_raised_by = $4, \
             status          = $5 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(channel)
    .bind(message_ts)
    .bind(raised_by)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a tracker ticket for a post; proposes `in_progress`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn create_ticket(
    pool: &PgPool,
    id: i64,
    ticket_id: &str,
    ticket_url: Option<&str>,
    ticket_system: &str,
) -> Result<(), DbError> {
    let status = fetch_status(pool, id)
        .await?
        .advance(WorkflowStatus::InProgress);

    sqlx::query(
        "UPDATE classified_posts \
         SET ticket_created    = TRUE, \
             ticket_id         = $2, \
             ticket_url        = $3, \
             ticket_system     = $4, \
             ticket_created_at = NOW(), \
             status            = $5 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(ticket_id)
    .bind(ticket_url)
    .bind(ticket_system)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Assigns a post to a team (and optionally a person); proposes `in_progress`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn assign_post(
    pool: &PgPool,
    id: i64,
    team: &str,
    assignee: Option<&str>,
) -> Result<(), DbError> {
    let status = fetch_status(pool, id)
        .await?
        .advance(WorkflowStatus::InProgress);

    sqlx::query(
        "UPDATE classified_posts \
         SET assigned_team = $2, \
             assigned_to   = $3, \
             status        = $4 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(team)
    .bind(assignee)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks a post resolved with a resolution note; proposes `resolved`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn resolve_post(pool: &PgPool, id: i64, resolution: &str) -> Result<(), DbError> {
    let status = fetch_status(pool, id)
        .await?
        .advance(WorkflowStatus::Resolved);

    sqlx::query(
        "UPDATE classified_posts \
         SET resolution  = $2, \
             resolved_at = NOW(), \
             status      = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(resolution)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Appends a timestamped internal note. Does not touch status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the post does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn add_internal_note(pool: &PgPool, id: i64, note: &str) -> Result<(), DbError> {
    let stamped = format!("[{}] {note}", Utc::now().to_rfc3339());

    let result = sqlx::query(
        "UPDATE classified_posts \
         SET internal_notes = CASE \
             WHEN internal_notes IS NULL THEN $2 \
             ELSE internal_notes || E'\\n\\n' || $2 \
         END \
         WHERE id = $1",
    )
    .bind(id)
    .bind(stamped)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
