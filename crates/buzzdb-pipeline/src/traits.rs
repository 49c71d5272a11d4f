//! Seams the pipelines are written against.
//!
//! The ingestion and classification loops only ever talk to these traits.
//! Production wires them to the Postgres repositories and the real adapter
//! and classifier clients; tests wire them to in-memory fakes and scripted
//! sources so the pipeline invariants can be asserted without I/O.

use chrono::{DateTime, Utc};

use buzzdb_classifier::{ClassifierClient, ClassifierError, ClassifierOutcome, ClassifyInput};
use buzzdb_core::{NormalizedPost, Platform};
use buzzdb_db::{DbError, NewClassification};
use buzzdb_scraper::token::TokenStore;
use buzzdb_scraper::{ConversationThread, ScraperError, SearchPage, TwitterClient};

/// A half-open ingestion window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Result of an insert keyed by a natural id: either the row is new, or the
/// key collided and the write was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Platform search + detail API as the ingestion pipeline sees it.
pub trait ContentSource {
    fn platform(&self) -> Platform;

    /// One page of search results for `query` within `window`.
    async fn search_page(
        &mut self,
        query: &str,
        window: TimeWindow,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ScraperError>;

    /// The full conversation thread for an id found during search. This is
    /// the expensive follow-up call that the dedup check guards.
    async fn fetch_conversation(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationThread, ScraperError>;
}

impl<T: ContentSource> ContentSource for &mut T {
    fn platform(&self) -> Platform {
        (**self).platform()
    }

    async fn search_page(
        &mut self,
        query: &str,
        window: TimeWindow,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ScraperError> {
        (**self).search_page(query, window, cursor).await
    }

    async fn fetch_conversation(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationThread, ScraperError> {
        (**self).fetch_conversation(conversation_id).await
    }
}

impl<S: TokenStore> ContentSource for TwitterClient<S> {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn search_page(
        &mut self,
        query: &str,
        window: TimeWindow,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ScraperError> {
        TwitterClient::search_page(
            self,
            query,
            window.start.timestamp(),
            window.end.timestamp(),
            cursor,
        )
        .await
    }

    async fn fetch_conversation(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationThread, ScraperError> {
        TwitterClient::fetch_conversation(self, conversation_id).await
    }
}

/// Durable ingestion-progress record per `(source, query)` pair.
pub trait CheckpointStore {
    /// Last recorded window end — the next window's start — or `None` when
    /// no checkpoint exists yet.
    async fn window_start(
        &self,
        source: Platform,
        query: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError>;

    /// Counts one run attempt, creating the record if needed.
    async fn record_attempt(&self, source: Platform, query: &str) -> Result<(), DbError>;

    /// Marks `window` fully processed. Only called after fetch and persist
    /// completed without fatal error.
    async fn advance(
        &self,
        source: Platform,
        query: &str,
        window: TimeWindow,
    ) -> Result<(), DbError>;
}

/// Append-only raw post storage deduplicated by `(platform, post_id)`.
pub trait PostStore {
    async fn insert_post(
        &self,
        post: &NormalizedPost,
        search_query: Option<&str>,
        company: &str,
    ) -> Result<InsertOutcome, DbError>;
}

/// Conversation storage deduplicated by conversation id.
pub trait ConversationStore {
    async fn exists(&self, conversation_id: &str) -> Result<bool, DbError>;

    async fn insert(
        &self,
        thread: &ConversationThread,
        search_query: Option<&str>,
    ) -> Result<InsertOutcome, DbError>;
}

/// Filter for the unclassified-posts query.
#[derive(Debug, Clone, Default)]
pub struct UnclassifiedFilter {
    pub platform: Option<Platform>,
    pub company: Option<String>,
    pub limit: i64,
}

/// The slice of a raw post the classification loop needs.
#[derive(Debug, Clone)]
pub struct UnclassifiedPost {
    pub id: i64,
    pub platform: String,
    pub company: String,
    pub full_text: String,
    pub image_url: Option<String>,
}

/// Storage side of the classification pipeline.
pub trait ClassificationStore {
    async fn list_unclassified(
        &self,
        filter: &UnclassifiedFilter,
    ) -> Result<Vec<UnclassifiedPost>, DbError>;

    /// Persists the judgment and flips the raw post's `is_classified` flag
    /// as one operation.
    async fn save_classification(
        &self,
        raw_post_id: i64,
        classification: &NewClassification,
    ) -> Result<i64, DbError>;
}

/// The classifier collaborator as the pipeline sees it.
pub trait Classify {
    async fn classify(&self, input: &ClassifyInput) -> Result<ClassifierOutcome, ClassifierError>;
}

impl Classify for ClassifierClient {
    async fn classify(&self, input: &ClassifyInput) -> Result<ClassifierOutcome, ClassifierError> {
        ClassifierClient::classify(self, input).await
    }
}
