//! Source adapters for the social-listening pipeline.
//!
//! One adapter per platform: each wraps the platform's search/detail API,
//! paces and retries requests, and canonicalizes wire payloads into
//! [`buzzdb_core::NormalizedPost`]. Adapters carry no durable ingestion
//! state — checkpoints live in the database — only lightweight per-process
//! helpers (rotating transaction token, recently-seen-id state file).

pub mod error;
pub mod linkedin;
pub mod relative_time;
pub mod state;
pub mod token;
pub mod twitter;
pub mod types;

mod rate_limit;

pub use error::ScraperError;
pub use linkedin::{LinkedinClient, LinkedinConfig};
pub use relative_time::parse_relative_time;
pub use state::{AdapterState, AdapterStateFile};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TransactionRotator};
pub use twitter::{TwitterClient, TwitterConfig};
pub use types::{ConversationThread, SearchPage};
