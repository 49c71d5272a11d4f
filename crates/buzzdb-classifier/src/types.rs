//! Classifier input/output contract types.

use serde::Deserialize;

use buzzdb_core::Category;

/// Input for one classification call: the post text plus, when the post
/// carried a screenshot, its first image URL.
#[derive(Debug, Clone)]
pub struct ClassifyInput {
    pub text: String,
    pub image_url: Option<String>,
}

/// The structured judgment parsed from the model's JSON reply.
#[derive(Debug, Clone, Deserialize)]
pub struct Judgment {
    pub is_spam: bool,
    #[serde(default)]
    pub spam_reason: Option<String>,
    /// `None` when the model declines to categorize (expected for spam).
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<i16>,
    #[serde(default)]
    pub urgency_score: Option<i16>,
    #[serde(default)]
    pub impact_score: Option<i16>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_issues: Vec<String>,
    #[serde(default)]
    pub suggested_action: Option<String>,
}

/// Token accounting reported by the endpoint, for cost tracking.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: Option<i32>,
    #[serde(default)]
    pub completion_tokens: Option<i32>,
    #[serde(default)]
    pub total_tokens: Option<i32>,
}

/// A successful classification: the judgment plus its token cost.
#[derive(Debug, Clone)]
pub struct ClassifierOutcome {
    pub judgment: Judgment,
    pub usage: TokenUsage,
}

/// Construction parameters for [`crate::ClassifierClient`].
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Endpoint origin, e.g. `https://myresource.cognitiveservices.azure.com`.
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}
