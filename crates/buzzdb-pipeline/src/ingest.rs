//! The checkpointed ingestion pipeline.
//!
//! One run walks `Idle → ComputeWindow → Fetch → Dedup → Persist →
//! AdvanceCheckpoint`. The checkpoint only moves after the whole window has
//! been fetched and persisted; a fatal failure anywhere before that leaves
//! the checkpoint untouched so the next invocation retries the same window
//! from scratch. Re-fetched content is absorbed by natural-key dedup, which
//! is what makes retries and overlapping runs safe.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use buzzdb_core::NormalizedPost;

use crate::error::PipelineError;
use crate::stats::{IngestRunStats, RunOutcome, RunReport, SweepStats};
use crate::traits::{
    CheckpointStore, ContentSource, ConversationStore, InsertOutcome, PostStore, TimeWindow,
};

/// Tuning for one ingestion session.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub search_query: String,
    /// Slug of the tracked company this query belongs to.
    pub company: String,
    pub window_minutes: i64,
    /// Bounded number of window iterations per session.
    pub max_runs: u32,
    /// Sleep between iterations.
    pub interval: Duration,
    /// Sleep between conversation detail fetches.
    pub item_delay: Duration,
    /// Safety cap on pages per window, bounding unbounded-result runaway.
    pub page_limit: usize,
    /// Window start used when no checkpoint exists yet.
    pub epoch_start: DateTime<Utc>,
    /// Bypass the checkpoint and dedup prechecks; storage natural keys
    /// still absorb collisions as skips.
    pub full_refresh: bool,
    /// Fetch full conversation threads for discovered conversation ids
    /// (Twitter enrichment).
    pub fetch_conversations: bool,
}

/// Windowed, resumable ingestion over one `(source, query)` pair.
pub struct IngestPipeline<'a, S, C, P, V> {
    source: S,
    checkpoints: &'a C,
    posts: &'a P,
    conversations: &'a V,
    config: IngestConfig,
}

impl<'a, S, C, P, V> IngestPipeline<'a, S, C, P, V>
where
    S: ContentSource,
    C: CheckpointStore,
    P: PostStore,
    V: ConversationStore,
{
    pub fn new(
        source: S,
        checkpoints: &'a C,
        posts: &'a P,
        conversations: &'a V,
        config: IngestConfig,
    ) -> Self {
        Self {
            source,
            checkpoints,
            posts,
            conversations,
            config,
        }
    }

    /// Runs up to `max_runs` window iterations with the configured delay
    /// between them. A failed run is reported and does not stop the
    /// session; its window is retried on the next iteration because the
    /// checkpoint did not move.
    pub async fn run(&mut self) -> Vec<RunReport> {
        let mut reports = Vec::new();

        for run in 1..=self.config.max_runs {
            tracing::info!(
                run,
                max_runs = self.config.max_runs,
                query = %self.config.search_query,
                "starting ingestion run"
            );

            let result = self.run_once().await;
            match &result {
                Ok(RunOutcome::UpToDate) => {
                    tracing::info!(run, "caught up to now, nothing to fetch");
                }
                Ok(RunOutcome::Completed(stats)) => {
                    tracing::info!(
                        run,
                        found = stats.found,
                        saved = stats.saved,
                        skipped = stats.skipped,
                        errors = stats.errors,
                        "ingestion run complete"
                    );
                }
                Err(e) => {
                    tracing::error!(run, error = %e, "ingestion run failed — window will be retried");
                }
            }
            reports.push(RunReport { run, result });

            if run < self.config.max_runs && !self.config.interval.is_zero() {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        reports
    }

    /// Runs a single window iteration against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] on adapter failure during search or any
    /// storage failure. The checkpoint is not advanced in either case.
    pub async fn run_once(&mut self) -> Result<RunOutcome, PipelineError> {
        self.run_once_at(Utc::now()).await
    }

    /// [`Self::run_once`] with an explicit "now", for deterministic window
    /// arithmetic in tests.
    ///
    /// # Errors
    ///
    /// See [`Self::run_once`].
    pub async fn run_once_at(&mut self, now: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let platform = self.source.platform();
        let query = self.config.search_query.clone();

        // ComputeWindow: resume from the checkpoint, or the epoch on first
        // run; clamp so we never search into the future.
        let window_start = if self.config.full_refresh {
            self.config.epoch_start
        } else {
            self.checkpoints
                .window_start(platform, &query)
                .await?
                .unwrap_or(self.config.epoch_start)
        };

        let mut window_end = window_start + chrono::Duration::minutes(self.config.window_minutes);
        if window_end > now {
            window_end = now;
        }

        if window_start >= window_end {
            return Ok(RunOutcome::UpToDate);
        }

        let window = TimeWindow {
            start: window_start,
            end: window_end,
        };

        self.checkpoints.record_attempt(platform, &query).await?;

        let mut stats = IngestRunStats {
            window_start: Some(window.start),
            window_end: Some(window.end),
            ..IngestRunStats::default()
        };

        // Fetch: every page of the window before persisting anything, so a
        // mid-window abort never leaves a half-persisted window behind an
        // advanced checkpoint.
        let posts = self.fetch_window(&query, window, &mut stats).await?;
        stats.found = posts.len();

        // Persist: insert-or-skip on the natural key.
        for post in &posts {
            match self
                .posts
                .insert_post(post, Some(&query), &self.config.company)
                .await?
            {
                InsertOutcome::Inserted => stats.saved += 1,
                InsertOutcome::Duplicate => stats.skipped += 1,
            }
        }

        if self.config.fetch_conversations {
            self.enrich_conversations(&query, &posts, &mut stats).await?;
        }

        // AdvanceCheckpoint: strictly after persist. Per-item errors above
        // are in the stats; the window as a whole counts as processed.
        self.checkpoints.advance(platform, &query, window).await?;

        Ok(RunOutcome::Completed(stats))
    }

    async fn fetch_window(
        &mut self,
        query: &str,
        window: TimeWindow,
        stats: &mut IngestRunStats,
    ) -> Result<Vec<NormalizedPost>, PipelineError> {
        let mut posts: Vec<NormalizedPost> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > self.config.page_limit {
                tracing::warn!(
                    query,
                    page_limit = self.config.page_limit,
                    "window hit the page cap; remaining results are left for dedup on overlap"
                );
                break;
            }

            let page = self
                .source
                .search_page(query, window, cursor.as_deref())
                .await?;
            stats.errors += page.parse_errors;

            let empty = page.posts.is_empty();
            posts.extend(page.posts);
            cursor = page.next_cursor;

            if cursor.is_none() || empty {
                break;
            }
        }

        Ok(posts)
    }

    /// Fetches and stores full threads for the conversation ids discovered
    /// in this window. The existence check runs BEFORE the detail fetch —
    /// under high window overlap this is what bounds wasted API calls.
    async fn enrich_conversations(
        &mut self,
        query: &str,
        posts: &[NormalizedPost],
        stats: &mut IngestRunStats,
    ) -> Result<(), PipelineError> {
        let conversation_ids: BTreeSet<&str> = posts
            .iter()
            .filter_map(|p| p.conversation_id.as_deref())
            .collect();

        let mut first = true;
        for conversation_id in conversation_ids {
            if !self.config.full_refresh && self.conversations.exists(conversation_id).await? {
                stats.conversations_skipped += 1;
                continue;
            }

            if !first && !self.config.item_delay.is_zero() {
                tokio::time::sleep(self.config.item_delay).await;
            }
            first = false;

            match self.source.fetch_conversation(conversation_id).await {
                Ok(thread) => match self.conversations.insert(&thread, Some(query)).await? {
                    InsertOutcome::Inserted => stats.conversations_saved += 1,
                    InsertOutcome::Duplicate => stats.conversations_skipped += 1,
                },
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(
                        conversation_id,
                        error = %e,
                        "conversation fetch failed; recorded and skipped"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Sweep-mode ingestion for sources without reliable absolute timestamps
/// (LinkedIn): persist an already-fetched batch, deduped by natural key,
/// with no checkpoint involvement.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] if an insert fails.
pub async fn sweep_ingest<P: PostStore>(
    store: &P,
    posts: &[NormalizedPost],
    search_query: &str,
    company: &str,
) -> Result<SweepStats, PipelineError> {
    let mut stats = SweepStats {
        found: posts.len(),
        ..SweepStats::default()
    };

    for post in posts {
        match store.insert_post(post, Some(search_query), company).await? {
            InsertOutcome::Inserted => stats.saved += 1,
            InsertOutcome::Duplicate => stats.skipped += 1,
        }
    }

    Ok(stats)
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
