use thiserror::Error;

/// Fatal pipeline errors. Per-item failures (one conversation fetch, one
/// classifier call) are recorded in run statistics instead; only failures
/// that invalidate the whole run surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] buzzdb_scraper::ScraperError),

    #[error(transparent)]
    Store(#[from] buzzdb_db::DbError),
}
