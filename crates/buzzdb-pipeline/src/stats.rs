//! Run statistics. A run always reports counts — found, saved, skipped,
//! errored — and partial success is a normal terminal state, never an
//! exception.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use buzzdb_core::Category;
use buzzdb_db::NewClassification;

use crate::error::PipelineError;

/// Counts for one completed ingestion window.
#[derive(Debug, Clone, Default)]
pub struct IngestRunStats {
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    /// Posts returned by search across all pages of the window.
    pub found: usize,
    pub saved: usize,
    pub skipped: usize,
    /// Per-item failures: unparsable entries and failed conversation fetches.
    pub errors: usize,
    pub conversations_saved: usize,
    pub conversations_skipped: usize,
}

/// Terminal state of one ingestion run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The computed window was empty after clamping to now — nothing new to
    /// fetch, checkpoint untouched.
    UpToDate,
    Completed(IngestRunStats),
}

/// One entry per attempted run in a bounded ingestion session.
#[derive(Debug)]
pub struct RunReport {
    pub run: u32,
    pub result: Result<RunOutcome, PipelineError>,
}

/// Counts for a keyword-sweep ingestion (no checkpoint window).
#[derive(Debug, Clone, Default)]
pub struct SweepStats {
    pub found: usize,
    pub saved: usize,
    pub skipped: usize,
}

/// Aggregates for one classification run.
#[derive(Debug, Clone, Default)]
pub struct ClassifyStats {
    pub fetched: usize,
    pub classified: usize,
    pub failed: usize,
    pub spam: usize,
    pub categories: BTreeMap<Category, usize>,
    pub products: BTreeMap<String, usize>,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    sentiment_sum: i64,
    sentiment_n: usize,
    urgency_sum: i64,
    urgency_n: usize,
    impact_sum: i64,
    impact_n: usize,
}

impl ClassifyStats {
    /// Folds one successful classification into the aggregates.
    pub fn record(&mut self, classification: &NewClassification) {
        self.classified += 1;

        if classification.is_spam {
            self.spam += 1;
        } else {
            if let Some(category) = classification.category {
                *self.categories.entry(category).or_default() += 1;
            }
            if let Some(product) = &classification.product {
                *self.products.entry(product.clone()).or_default() += 1;
            }
            if let Some(score) = classification.sentiment_score {
                self.sentiment_sum += i64::from(score);
                self.sentiment_n += 1;
            }
            if let Some(score) = classification.urgency_score {
                self.urgency_sum += i64::from(score);
                self.urgency_n += 1;
            }
            if let Some(score) = classification.impact_score {
                self.impact_sum += i64::from(score);
                self.impact_n += 1;
            }
        }

        self.prompt_tokens += i64::from(classification.prompt_tokens.unwrap_or(0));
        self.completion_tokens += i64::from(classification.completion_tokens.unwrap_or(0));
        self.total_tokens += i64::from(classification.total_tokens.unwrap_or(0));
    }

    #[must_use]
    pub fn avg_sentiment(&self) -> Option<f64> {
        mean(self.sentiment_sum, self.sentiment_n)
    }

    #[must_use]
    pub fn avg_urgency(&self) -> Option<f64> {
        mean(self.urgency_sum, self.urgency_n)
    }

    #[must_use]
    pub fn avg_impact(&self) -> Option<f64> {
        mean(self.impact_sum, self.impact_n)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(sum: i64, n: usize) -> Option<f64> {
    if n == 0 {
        None
    } else {
        Some(sum as f64 / n as f64)
    }
}
