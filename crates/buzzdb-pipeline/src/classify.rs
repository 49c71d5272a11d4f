//! The classification pipeline: pull unclassified raw posts, invoke the
//! classifier, persist judgments, leave failures for the next run.

use std::time::Duration;

use buzzdb_classifier::{ClassifierOutcome, ClassifyInput};
use buzzdb_core::priority_for;
use buzzdb_db::NewClassification;

use crate::error::PipelineError;
use crate::stats::ClassifyStats;
use crate::traits::{ClassificationStore, Classify, UnclassifiedFilter};

/// Tuning for one classification run.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub filter: UnclassifiedFilter,
    /// Sleep between classifier calls, bounding burst rate at the endpoint.
    pub delay: Duration,
}

/// Batch classification over unclassified raw posts.
pub struct ClassifyPipeline<'a, C, S> {
    classifier: &'a C,
    store: &'a S,
    config: ClassifyConfig,
}

impl<'a, C, S> ClassifyPipeline<'a, C, S>
where
    C: Classify,
    S: ClassificationStore,
{
    pub fn new(classifier: &'a C, store: &'a S, config: ClassifyConfig) -> Self {
        Self {
            classifier,
            store,
            config,
        }
    }

    /// Classifies one batch.
    ///
    /// A failed classifier call leaves the post's `is_classified` flag
    /// false, so the next run's unclassified query returns it again —
    /// at-least-once retry without any retry bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] on storage failure. Classifier
    /// failures are per-item and recorded in the stats instead.
    pub async fn run(&self) -> Result<ClassifyStats, PipelineError> {
        let posts = self.store.list_unclassified(&self.config.filter).await?;

        let mut stats = ClassifyStats::default();
        stats.fetched = posts.len();

        tracing::info!(count = posts.len(), "classifying unclassified posts");

        for (i, post) in posts.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            let input = ClassifyInput {
                text: post.full_text.clone(),
                image_url: post.image_url.clone(),
            };

            match self.classifier.classify(&input).await {
                Ok(outcome) => {
                    let classification = build_classification(outcome);
                    self.store
                        .save_classification(post.id, &classification)
                        .await?;
                    stats.record(&classification);
                    tracing::debug!(
                        raw_post_id = post.id,
                        is_spam = classification.is_spam,
                        category = ?classification.category,
                        priority = %classification.priority,
                        "post classified"
                    );
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(
                        raw_post_id = post.id,
                        error = %e,
                        "classification failed — post stays unclassified and will be retried"
                    );
                }
            }
        }

        Ok(stats)
    }
}

/// Converts a classifier outcome into the persistable record: spam posts
/// carry no category, and priority is derived from the scores here — the
/// only place it is ever computed.
fn build_classification(outcome: ClassifierOutcome) -> NewClassification {
    let judgment = outcome.judgment;
    let category = if judgment.is_spam {
        None
    } else {
        judgment.category
    };

    NewClassification {
        priority: priority_for(judgment.urgency_score, judgment.impact_score),
        is_spam: judgment.is_spam,
        spam_reason: judgment.spam_reason,
        category,
        product: judgment.product,
        sentiment_score: judgment.sentiment_score,
        urgency_score: judgment.urgency_score,
        impact_score: judgment.impact_score,
        summary: judgment.summary,
        key_issues: judgment.key_issues,
        suggested_action: judgment.suggested_action,
        prompt_tokens: outcome.usage.prompt_tokens,
        completion_tokens: outcome.usage.completion_tokens,
        total_tokens: outcome.usage.total_tokens,
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
