use thiserror::Error;

/// Errors returned by the classifier client.
///
/// The classification pipeline treats every variant the same way — the post
/// stays unclassified and is retried on a later run — so the taxonomy here
/// exists for logging and for the client's own retry decision, not for
/// caller branching.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status.
    #[error("classifier endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The completion arrived but carried no message content.
    #[error("classifier response has no message content")]
    MissingContent,

    /// The response (or the judgment JSON inside it) could not be parsed.
    #[error("failed to parse classifier {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
