//! In-memory fakes and scripted collaborators for pipeline tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use buzzdb_classifier::{
    ClassifierError, ClassifierOutcome, ClassifyInput, Judgment, TokenUsage,
};
use buzzdb_core::{
    Category, EngagementMetrics, NormalizedPost, Platform, PostAuthor,
};
use buzzdb_db::{DbError, NewClassification};
use buzzdb_scraper::{ConversationThread, ScraperError, SearchPage};

use crate::traits::{
    CheckpointStore, ClassificationStore, Classify, ContentSource, ConversationStore,
    InsertOutcome, PostStore, TimeWindow, UnclassifiedFilter, UnclassifiedPost,
};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub(crate) fn make_post(post_id: &str, conversation_id: Option<&str>) -> NormalizedPost {
    NormalizedPost {
        platform: Platform::Twitter,
        post_id: post_id.to_owned(),
        full_text: format!("post {post_id} about Razorpay"),
        language: Some("en".to_owned()),
        author: PostAuthor {
            username: Some("someone".to_owned()),
            ..PostAuthor::default()
        },
        metrics: EngagementMetrics::default(),
        post_url: None,
        is_reply: false,
        conversation_id: conversation_id.map(str::to_owned),
        media_urls: vec![],
        posted_at: None,
        payload: serde_json::json!({ "id": post_id }),
    }
}

pub(crate) fn make_page(posts: Vec<NormalizedPost>, cursor: Option<&str>) -> SearchPage {
    SearchPage {
        posts,
        next_cursor: cursor.map(str::to_owned),
        parse_errors: 0,
    }
}

pub(crate) fn make_thread(conversation_id: &str, replies: usize) -> ConversationThread {
    ConversationThread {
        conversation_id: conversation_id.to_owned(),
        main_post: make_post(conversation_id, Some(conversation_id)),
        replies: (0..replies)
            .map(|i| make_post(&format!("{conversation_id}-r{i}"), Some(conversation_id)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Scripted content source
// ---------------------------------------------------------------------------

/// Serves a scripted sequence of search pages and a fixed conversation map,
/// counting calls so tests can assert what the pipeline actually invoked.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    pub pages: VecDeque<SearchPage>,
    pub conversations: HashMap<String, ConversationThread>,
    pub fail_search: bool,
    pub failing_conversations: HashSet<String>,
    pub search_calls: usize,
    pub conversation_calls: usize,
}

impl ScriptedSource {
    pub fn with_pages(pages: Vec<SearchPage>) -> Self {
        Self {
            pages: pages.into(),
            ..Self::default()
        }
    }

    pub fn add_conversation(&mut self, thread: ConversationThread) {
        self.conversations
            .insert(thread.conversation_id.clone(), thread);
    }
}

impl ContentSource for ScriptedSource {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn search_page(
        &mut self,
        _query: &str,
        _window: TimeWindow,
        _cursor: Option<&str>,
    ) -> Result<SearchPage, ScraperError> {
        self.search_calls += 1;
        if self.fail_search {
            return Err(ScraperError::UnexpectedStatus {
                status: 500,
                url: "scripted://search".to_owned(),
            });
        }
        Ok(self
            .pages
            .pop_front()
            .unwrap_or_else(|| make_page(vec![], None)))
    }

    async fn fetch_conversation(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationThread, ScraperError> {
        self.conversation_calls += 1;
        if self.failing_conversations.contains(conversation_id) {
            return Err(ScraperError::UnexpectedStatus {
                status: 500,
                url: format!("scripted://conversation/{conversation_id}"),
            });
        }
        self.conversations
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| ScraperError::Normalization {
                post_id: conversation_id.to_owned(),
                reason: "not scripted".to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// In-memory checkpoint store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CheckpointState {
    window_end: Option<DateTime<Utc>>,
    attempt_count: u32,
    advances: Vec<TimeWindow>,
}

#[derive(Default)]
pub(crate) struct MemoryCheckpoints {
    state: Mutex<CheckpointState>,
}

impl MemoryCheckpoints {
    pub fn attempts(&self) -> u32 {
        self.state.lock().unwrap().attempt_count
    }

    pub fn advances(&self) -> Vec<TimeWindow> {
        self.state.lock().unwrap().advances.clone()
    }
}

impl CheckpointStore for MemoryCheckpoints {
    async fn window_start(
        &self,
        _source: Platform,
        _query: &str,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        Ok(self.state.lock().unwrap().window_end)
    }

    async fn record_attempt(&self, _source: Platform, _query: &str) -> Result<(), DbError> {
        self.state.lock().unwrap().attempt_count += 1;
        Ok(())
    }

    async fn advance(
        &self,
        _source: Platform,
        _query: &str,
        window: TimeWindow,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.window_end = Some(match state.window_end {
            Some(existing) => existing.max(window.end),
            None => window.end,
        });
        state.advances.push(window);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory post/conversation/classification store
// ---------------------------------------------------------------------------

pub(crate) struct StoredPost {
    pub id: i64,
    pub platform: Platform,
    pub post_id: String,
    pub company: String,
    pub full_text: String,
    pub classified: bool,
}

#[derive(Default)]
struct StoreState {
    posts: Vec<StoredPost>,
    conversations: HashSet<String>,
    classifications: Vec<(i64, NewClassification)>,
}

/// One fake implementing all storage traits, so ingest and classify tests
/// can share state the way the real database does.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn classified_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|p| p.classified)
            .count()
    }

    pub fn seed_conversation(&self, conversation_id: &str) {
        self.state
            .lock()
            .unwrap()
            .conversations
            .insert(conversation_id.to_owned());
    }

    pub fn conversation_count(&self) -> usize {
        self.state.lock().unwrap().conversations.len()
    }

    pub fn classifications(&self) -> Vec<(i64, NewClassification)> {
        self.state.lock().unwrap().classifications.clone()
    }
}

impl PostStore for MemoryStore {
    async fn insert_post(
        &self,
        post: &NormalizedPost,
        _search_query: Option<&str>,
        company: &str,
    ) -> Result<InsertOutcome, DbError> {
        let mut state = self.state.lock().unwrap();
        let duplicate = state
            .posts
            .iter()
            .any(|p| p.platform == post.platform && p.post_id == post.post_id);
        if duplicate {
            return Ok(InsertOutcome::Duplicate);
        }
        let id = i64::try_from(state.posts.len()).unwrap() + 1;
        state.posts.push(StoredPost {
            id,
            platform: post.platform,
            post_id: post.post_id.clone(),
            company: company.to_owned(),
            full_text: post.full_text.clone(),
            classified: false,
        });
        Ok(InsertOutcome::Inserted)
    }
}

impl ConversationStore for MemoryStore {
    async fn exists(&self, conversation_id: &str) -> Result<bool, DbError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .conversations
            .contains(conversation_id))
    }

    async fn insert(
        &self,
        thread: &ConversationThread,
        _search_query: Option<&str>,
    ) -> Result<InsertOutcome, DbError> {
        let mut state = self.state.lock().unwrap();
        if state.conversations.insert(thread.conversation_id.clone()) {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }
}

impl ClassificationStore for MemoryStore {
    async fn list_unclassified(
        &self,
        filter: &UnclassifiedFilter,
    ) -> Result<Vec<UnclassifiedPost>, DbError> {
        let state = self.state.lock().unwrap();
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        Ok(state
            .posts
            .iter()
            .filter(|p| !p.classified)
            .filter(|p| filter.platform.is_none_or(|platform| p.platform == platform))
            .filter(|p| {
                filter
                    .company
                    .as_deref()
                    .is_none_or(|company| p.company == company)
            })
            .take(limit)
            .map(|p| UnclassifiedPost {
                id: p.id,
                platform: p.platform.as_str().to_owned(),
                company: p.company.clone(),
                full_text: p.full_text.clone(),
                image_url: None,
            })
            .collect())
    }

    async fn save_classification(
        &self,
        raw_post_id: i64,
        classification: &NewClassification,
    ) -> Result<i64, DbError> {
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == raw_post_id && !p.classified)
            .ok_or(DbError::NotFound)?;
        post.classified = true;
        state.classifications.push((raw_post_id, classification.clone()));
        Ok(i64::try_from(state.classifications.len()).unwrap())
    }
}

// ---------------------------------------------------------------------------
// Fake classifier
// ---------------------------------------------------------------------------

/// Scripted classifier behavior for pipeline tests.
pub(crate) enum FakeClassifier {
    /// Succeeds with a fixed high-urgency breakage judgment.
    Deterministic,
    /// Succeeds with a spam judgment that (incorrectly) also carries a
    /// category, to exercise the pipeline's spam sanitization.
    SpamWithCategory,
    /// Fails every call with a transient endpoint error.
    Failing,
}

impl Classify for FakeClassifier {
    async fn classify(
        &self,
        _input: &ClassifyInput,
    ) -> Result<ClassifierOutcome, ClassifierError> {
        let usage = TokenUsage {
            prompt_tokens: Some(100),
            completion_tokens: Some(20),
            total_tokens: Some(120),
        };
        match self {
            FakeClassifier::Deterministic => Ok(ClassifierOutcome {
                judgment: Judgment {
                    is_spam: false,
                    spam_reason: None,
                    category: Some(Category::ExperienceBreakage),
                    product: Some("Payment Gateway".to_owned()),
                    sentiment_score: Some(2),
                    urgency_score: Some(9),
                    impact_score: Some(8),
                    summary: Some("payment failure".to_owned()),
                    key_issues: vec!["payment failure".to_owned()],
                    suggested_action: Some("escalate".to_owned()),
                },
                usage,
            }),
            FakeClassifier::SpamWithCategory => Ok(ClassifierOutcome {
                judgment: Judgment {
                    is_spam: true,
                    spam_reason: Some("link farm".to_owned()),
                    category: Some(Category::Praise),
                    product: None,
                    sentiment_score: Some(5),
                    urgency_score: Some(1),
                    impact_score: Some(1),
                    summary: Some("spam".to_owned()),
                    key_issues: vec![],
                    suggested_action: None,
                },
                usage,
            }),
            FakeClassifier::Failing => Err(ClassifierError::Status {
                status: 503,
                body: "temporarily unavailable".to_owned(),
            }),
        }
    }
}
