//! Ingestion and classification pipelines.
//!
//! [`ingest::IngestPipeline`] drives the resumable, idempotent
//! scrape loop: compute the next time window from the checkpoint, fetch
//! every page, dedup against stored natural keys, persist, then — and only
//! then — advance the checkpoint. [`classify::ClassifyPipeline`] bridges
//! stored raw posts to the external classifier and the team workflow layer.
//!
//! Both are generic over the seams in [`traits`], so their invariants are
//! covered by in-memory tests while production wires in Postgres and the
//! real HTTP clients.

pub mod classify;
pub mod error;
pub mod ingest;
pub mod stats;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use classify::{ClassifyConfig, ClassifyPipeline};
pub use error::PipelineError;
pub use ingest::{sweep_ingest, IngestConfig, IngestPipeline};
pub use stats::{ClassifyStats, IngestRunStats, RunOutcome, RunReport, SweepStats};
pub use traits::{
    CheckpointStore, ClassificationStore, Classify, ContentSource, ConversationStore,
    InsertOutcome, PostStore, TimeWindow, UnclassifiedFilter, UnclassifiedPost,
};
