//! Postgres-backed implementations of the pipeline storage seams.
//!
//! Thin delegation onto the `buzzdb-db` query modules; no logic lives here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use buzzdb_core::{NormalizedPost, Platform};
use buzzdb_db::{DbError, NewClassification, NewConversation};
use buzzdb_pipeline::{
    CheckpointStore, ClassificationStore, ConversationStore, InsertOutcome, PostStore, TimeWindow,
    UnclassifiedFilter, UnclassifiedPost,
};
use buzzdb_scraper::ConversationThread;

/// All pipeline storage traits, backed by one connection pool.
#[derive(Clone, Copy)]
pub struct PgStores<'a> {
    pool: &'a PgPool,
}

impl<'a> PgStores<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CheckpointStore for PgStores<'_> {
    async fn window_start(
        &self,
        source: Platform,
        query: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        buzzdb_db::get_window_start(self.pool, source.as_str(), query).await
    }

    async fn record_attempt(&self, source: Platform, query: &str) -> Result<(), DbError> {
        buzzdb_db::record_attempt(self.pool, source.as_str(), query).await
    }

    async fn advance(
        &self,
        source: Platform,
        query: &str,
        window: TimeWindow,
    ) -> Result<(), DbError> {
        buzzdb_db::advance_checkpoint(self.pool, source.as_str(), query, window.start, window.end)
            .await
    }
}

impl PostStore for PgStores<'_> {
    async fn insert_post(
        &self,
        post: &NormalizedPost,
        search_query: Option<&str>,
        company: &str,
    ) -> Result<InsertOutcome, DbError> {
        let inserted = buzzdb_db::insert_raw_post(self.pool, post, search_query, company).await?;
        Ok(match inserted {
            Some(_) => InsertOutcome::Inserted,
            None => InsertOutcome::Duplicate,
        })
    }
}

impl ConversationStore for PgStores<'_> {
    async fn exists(&self, conversation_id: &str) -> Result<bool, DbError> {
        buzzdb_db::conversation_exists(self.pool, conversation_id).await
    }

    async fn insert(
        &self,
        thread: &ConversationThread,
        search_query: Option<&str>,
    ) -> Result<InsertOutcome, DbError> {
        let thread_json =
            serde_json::to_value(thread).unwrap_or_else(|_| serde_json::Value::Null);

        let conversation = NewConversation {
            conversation_id: &thread.conversation_id,
            source: thread.main_post.platform.as_str(),
            main_post_id: &thread.main_post.post_id,
            thread: &thread_json,
            reply_count: thread.reply_count(),
            search_query,
            started_at: thread.started_at(),
            last_reply_at: thread.last_reply_at(),
        };

        let inserted = buzzdb_db::insert_conversation(self.pool, &conversation).await?;
        Ok(match inserted {
            Some(_) => InsertOutcome::Inserted,
            None => InsertOutcome::Duplicate,
        })
    }
}

impl ClassificationStore for PgStores<'_> {
    async fn list_unclassified(
        &self,
        filter: &UnclassifiedFilter,
    ) -> Result<Vec<UnclassifiedPost>, DbError> {
        let rows = buzzdb_db::get_unclassified_posts(
            self.pool,
            filter.platform.map(Platform::as_str),
            filter.company.as_deref(),
            filter.limit,
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UnclassifiedPost {
                id: row.id,
                platform: row.platform.clone(),
                company: row.company.clone(),
                full_text: row.full_text.clone(),
                image_url: row.first_media_url(),
            })
            .collect())
    }

    async fn save_classification(
        &self,
        raw_post_id: i64,
        classification: &NewClassification,
    ) -> Result<i64, DbError> {
        buzzdb_db::save_classification(self.pool, raw_post_id, classification).await
    }
}
