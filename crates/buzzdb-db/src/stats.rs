//! Read-only aggregate queries for the `stats` CLI mode.
//!
//! Nothing in this module mutates state. Spam is reported as its own
//! counter and excluded from the category breakdown — the category column
//! is NULL for spam rows, so the two can never double-count.

use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Raw post count for one `(company, platform)` pair.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawPostCount {
    pub company: String,
    pub platform: String,
    pub total: i64,
    pub unclassified: i64,
}

/// Count keyed by a label (category name, product name, status).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub total: i64,
}

/// Aggregates over classified posts.
#[derive(Debug, Clone)]
pub struct ClassificationStats {
    pub total: i64,
    pub spam_count: i64,
    pub categories: Vec<LabelCount>,
    pub products: Vec<LabelCount>,
    pub avg_sentiment: Option<f64>,
    pub avg_urgency: Option<f64>,
    pub avg_impact: Option<f64>,
    pub total_tokens: i64,
}

/// Team-facing workflow aggregates.
#[derive(Debug, Clone)]
pub struct TeamDashboardStats {
    pub total: i64,
    pub statuses: Vec<LabelCount>,
    pub high_urgency_new: i64,
    pub raised_on_slack: i64,
    pub tickets_created: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Raw post counts grouped by company and platform.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_raw_post_counts(pool: &PgPool) -> Result<Vec<RawPostCount>, DbError> {
    let rows = sqlx::query_as::<_, RawPostCount>(
        "SELECT company, platform, \
                COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE is_classified = FALSE) AS unclassified \
         FROM raw_posts \
         GROUP BY company, platform \
         ORDER BY company, platform",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Aggregates over classified posts, optionally filtered by platform and
/// company. Category and score averages exclude spam.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_classification_stats(
    pool: &PgPool,
    platform: Option<&str>,
    company: Option<&str>,
) -> Result<ClassificationStats, DbError> {
    let (total, spam_count, avg_sentiment, avg_urgency, avg_impact, total_tokens): (
        i64,
        i64,
        Option<f64>,
        Option<f64>,
        Option<f64>,
        Option<i64>,
    ) = sqlx::query_as(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE is_spam), \
                AVG(sentiment_score) FILTER (WHERE NOT is_spam)::FLOAT8, \
                AVG(urgency_score) FILTER (WHERE NOT is_spam)::FLOAT8, \
                AVG(impact_score) FILTER (WHERE NOT is_spam)::FLOAT8, \
                SUM(total_tokens)::BIGINT \
         FROM classified_posts \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR company = $2)",
    )
    .bind(platform)
    .bind(company)
    .fetch_one(pool)
    .await?;

    let categories = sqlx::query_as::<_, LabelCount>(
        "SELECT category AS label, COUNT(*) AS total \
         FROM classified_posts \
         WHERE category IS NOT NULL AND is_spam = FALSE \
           AND ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR company = $2) \
         GROUP BY category \
         ORDER BY total DESC, label",
    )
    .bind(platform)
    .bind(company)
    .fetch_all(pool)
    .await?;

    let products = sqlx::query_as::<_, LabelCount>(
        "SELECT product AS label, COUNT(*) AS total \
         FROM classified_posts \
         WHERE product IS NOT NULL AND is_spam = FALSE \
           AND ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR company = $2) \
         GROUP BY product \
         ORDER BY total DESC, label",
    )
    .bind(platform)
    .bind(company)
    .fetch_all(pool)
    .await?;

    Ok(ClassificationStats {
        total,
        spam_count,
        categories,
        products,
        avg_sentiment,
        avg_urgency,
        avg_impact,
        total_tokens: total_tokens.unwrap_or(0),
    })
}

/// Workflow aggregates for the team dashboard, optionally company-filtered.
/// Spam is excluded throughout.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_team_dashboard_stats(
    pool: &PgPool,
    company: Option<&str>,
) -> Result<TeamDashboardStats, DbError> {
    let (total, high_urgency_new, raised_on_slack, tickets_created): (i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE urgency_score >= 7 AND status = 'new'), \
                    COUNT(*) FILTER (WHERE raised_on_slack), \
                    COUNT(*) FILTER (WHERE ticket_created) \
             FROM classified_posts \
             WHERE is_spam = FALSE \
               AND ($1::TEXT IS NULL OR company = $1)",
        )
        .bind(company)
        .fetch_one(pool)
        .await?;

    let statuses = sqlx::query_as::<_, LabelCount>(
        "SELECT status AS label, COUNT(*) AS total \
         FROM classified_posts \
         WHERE is_spam = FALSE \
           AND ($1::TEXT IS NULL OR company = $1) \
         GROUP BY status \
         ORDER BY total DESC, label",
    )
    .bind(company)
    .fetch_all(pool)
    .await?;

    Ok(TeamDashboardStats {
        total,
        statuses,
        high_urgency_new,
        raised_on_slack,
        tickets_created,
    })
}
