//! HTTP client for the hosted chat-completions classifier endpoint.
//!
//! Sends the post text (plus optional image URL) with the company-specific
//! system prompt and parses the model's JSON reply into a typed
//! [`Judgment`]. The reply sometimes arrives wrapped in a markdown code
//! fence; that wrapper is stripped defensively before parsing.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::{json, Value};

use crate::error::ClassifierError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ChatCompletionResponse, ClassifierConfig, ClassifierOutcome, ClassifyInput, Judgment,
};

const MAX_COMPLETION_TOKENS: u32 = 800;
const TEMPERATURE: f64 = 0.3;

/// Client for the classifier's chat-completions endpoint.
pub struct ClassifierClient {
    client: Client,
    base_url: Url,
    deployment: String,
    api_version: String,
    api_key: String,
    system_prompt: String,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl ClassifierClient {
    /// Creates a client for the configured endpoint.
    ///
    /// `system_prompt` comes from [`crate::prompt::build_system_prompt`] and
    /// fixes the company and product taxonomy for every call.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidBaseUrl`] for an unparseable
    /// endpoint or [`ClassifierError::Http`] if the `reqwest::Client`
    /// cannot be built.
    pub fn new(config: &ClassifierConfig, system_prompt: String) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", config.endpoint.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClassifierError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
            system_prompt,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Classifies one post.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::Status`] — non-2xx response after retries.
    /// - [`ClassifierError::Http`] — transport failure after retries.
    /// - [`ClassifierError::MissingContent`] — completion with no content.
    /// - [`ClassifierError::Parse`] — response or judgment JSON did not
    ///   match the expected shape.
    ///
    /// The pipeline treats all of these identically: the post stays
    /// unclassified and is retried on a later run.
    pub async fn classify(
        &self,
        input: &ClassifyInput,
    ) -> Result<ClassifierOutcome, ClassifierError> {
        let url = self.completions_url()?;
        let payload = self.build_payload(input);

        let body = retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            let url = url.clone();
            let payload = payload.clone();
            async move { self.send_once(url, payload).await }
        })
        .await?;

        let completion: ChatCompletionResponse =
            serde_json::from_value(body).map_err(|e| ClassifierError::Parse {
                context: "completion envelope".to_owned(),
                source: e,
            })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ClassifierError::MissingContent)?;

        let judgment: Judgment = serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            ClassifierError::Parse {
                context: "judgment content".to_owned(),
                source: e,
            }
        })?;

        Ok(ClassifierOutcome {
            judgment,
            usage: completion.usage.unwrap_or_default(),
        })
    }

    fn completions_url(&self) -> Result<Url, ClassifierError> {
        let path = format!("openai/deployments/{}/chat/completions", self.deployment);
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| ClassifierError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    fn build_payload(&self, input: &ClassifyInput) -> Value {
        let mut user_content = vec![json!({
            "type": "text",
            "text": format!("Analyze and classify this post:\n\n\"{}\"", input.text),
        })];

        if let Some(image_url) = &input.image_url {
            user_content.push(json!({
                "type": "image_url",
                "image_url": { "url": image_url },
            }));
        }

        json!({
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": user_content },
            ],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
        })
    }

    async fn send_once(&self, url: Url, payload: Value) -> Result<Value, ClassifierError> {
        let response = self
            .client
            .post(url.clone())
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClassifierError::Parse {
            context: url.to_string(),
            source: e,
        })
    }
}

/// Strips an optional markdown code fence (```` ```json … ``` ````) from the
/// model's reply. A defensive unwrapping step, not a protocol guarantee.
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
