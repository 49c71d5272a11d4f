//! Twitter/X source adapter over the GraphQL timeline endpoints.
//!
//! Wraps `reqwest` with cookie/bearer auth, per-request anti-replay token
//! rotation, client-side pacing, and retry on transient errors. Search is
//! time-windowed via `since_time:`/`until_time:` query operators so the
//! ingestion pipeline can page through an exact window.

mod normalize;
pub mod types;

pub use normalize::{normalize_tweet, parse_twitter_timestamp};

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tokio::time::Instant;

use buzzdb_core::NormalizedPost;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::token::{TokenStore, TransactionRotator};
use crate::types::{ConversationThread, SearchPage};

const DEFAULT_BASE_URL: &str = "https://x.com/";

const SEARCH_TIMELINE_PATH: &str = "i/api/graphql/bshMIjqDk8LTXTq4w91WKw/SearchTimeline";
const TWEET_DETAIL_PATH: &str = "i/api/graphql/nBS-WpgA6ZG0CyNHD517JQ/TweetDetail";

/// Public web-client bearer token; per-account auth rides on the cookies.
const DEFAULT_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Seed for the rotating transaction token when neither config nor the
/// state file supplies one.
const DEFAULT_TRANSACTION_SEED: &str =
    "D1rHKLyEPoiMKMVHaht4PQUPOZ251HMAuf64wlWmEAw1UnvukjO2YQJs8GJwThEUbQtHKpj1DZjTKuZiWedmi2kMDD00";

/// Feature flags the GraphQL endpoints require on every request.
const FEATURES: &str = r#"{"responsive_web_graphql_timeline_navigation_enabled":true,"responsive_web_graphql_skip_user_profile_image_extensions_enabled":false,"communities_web_enable_tweet_community_results_fetch":true,"c9s_tweet_anatomy_moderator_badge_enabled":true,"articles_preview_enabled":true,"responsive_web_edit_tweet_api_enabled":true,"graphql_is_translatable_rweb_tweet_is_translatable_enabled":true,"view_counts_everywhere_api_enabled":true,"longform_notetweets_consumption_enabled":true,"tweet_awards_web_tipping_enabled":false,"freedom_of_speech_not_reach_fetch_enabled":true,"standardized_nudges_misinfo":true,"longform_notetweets_rich_text_read_enabled":true,"longform_notetweets_inline_media_enabled":true,"responsive_web_enhance_cards_enabled":false}"#;

/// Construction parameters for [`TwitterClient`].
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub auth_token: String,
    pub csrf_token: String,
    pub bearer_token: Option<String>,
    pub transaction_seed: Option<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

/// Twitter/X search + conversation client.
pub struct TwitterClient<S: TokenStore> {
    client: Client,
    base_url: Url,
    bearer_token: String,
    auth_token: String,
    csrf_token: String,
    tx: TransactionRotator<S>,
    inter_request_delay: Duration,
    last_request_at: Option<Instant>,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl<S: TokenStore> TwitterClient<S> {
    /// Creates a client pointed at the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ScraperError::TokenState`] if the token store cannot be
    /// read.
    pub fn new(config: TwitterConfig, token_store: S) -> Result<Self, ScraperError> {
        Self::with_base_url(config, token_store, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] for an unparseable base URL,
    /// [`ScraperError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`ScraperError::TokenState`] if the token store cannot be read.
    pub fn with_base_url(
        config: TwitterConfig,
        token_store: S,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;

        let seed = config
            .transaction_seed
            .unwrap_or_else(|| DEFAULT_TRANSACTION_SEED.to_owned());
        let tx = TransactionRotator::new(&seed, token_store)?;

        Ok(Self {
            client,
            base_url,
            bearer_token: config
                .bearer_token
                .unwrap_or_else(|| DEFAULT_BEARER_TOKEN.to_owned()),
            auth_token: config.auth_token,
            csrf_token: config.csrf_token,
            tx,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            last_request_at: None,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Fetches one page of search results for `query` restricted to the
    /// `[since_time, until_time)` window (Unix seconds).
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after retries exhausted.
    /// - [`ScraperError::AuthRejected`] — 401/403 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] / [`ScraperError::Http`] — other
    ///   failures after retries.
    /// - [`ScraperError::Deserialize`] — body is not valid JSON.
    pub async fn search_page(
        &mut self,
        query: &str,
        since_time: i64,
        until_time: i64,
        cursor: Option<&str>,
    ) -> Result<SearchPage, ScraperError> {
        let raw_query = format!("{query} until_time:{until_time} since_time:{since_time}");
        let mut variables = serde_json::json!({
            "rawQuery": raw_query,
            "count": 20,
            "querySource": "typed_query",
            "product": "Latest",
        });
        if let Some(cursor) = cursor {
            variables["cursor"] = Value::String(cursor.to_owned());
        }

        let url = self.graphql_url(SEARCH_TIMELINE_PATH, &variables)?;
        let body = self.request_json(url).await?;

        let mut posts: Vec<NormalizedPost> = Vec::new();
        let mut next_cursor = None;
        let mut parse_errors = 0usize;

        for entry in types::search_entries(&body) {
            if let Some(cursor_value) = types::entry_cursor_bottom(&entry) {
                next_cursor = Some(cursor_value);
                continue;
            }
            match types::entry_tweet(&entry) {
                Ok(Some((tweet, raw))) => match normalize_tweet(&tweet, raw) {
                    Ok(post) => posts.push(post),
                    Err(e) => {
                        parse_errors += 1;
                        tracing::warn!(error = %e, "skipping unnormalizable tweet");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    parse_errors += 1;
                    tracing::warn!(error = %e, "skipping malformed timeline entry");
                }
            }
        }

        // The API keeps returning a bottom cursor on exhausted timelines;
        // an empty page means there is nothing further to fetch.
        if posts.is_empty() {
            next_cursor = None;
        }

        Ok(SearchPage {
            posts,
            next_cursor,
            parse_errors,
        })
    }

    /// Fetches the full conversation thread for a conversation id.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::search_page`], plus
    /// [`ScraperError::Normalization`] when the thread contains no readable
    /// posts (deleted or withheld conversation).
    pub async fn fetch_conversation(
        &mut self,
        conversation_id: &str,
    ) -> Result<ConversationThread, ScraperError> {
        let variables = serde_json::json!({
            "focalTweetId": conversation_id,
            "with_rux_injections": false,
            "includePromotedContent": false,
        });

        let url = self.graphql_url(TWEET_DETAIL_PATH, &variables)?;
        let body = self.request_json(url).await?;

        let mut tweets: Vec<NormalizedPost> = Vec::new();
        for entry in types::conversation_entries(&body) {
            match types::entry_tweet(&entry) {
                Ok(Some((tweet, raw))) => match normalize_tweet(&tweet, raw) {
                    Ok(post) => tweets.push(post),
                    Err(e) => tracing::warn!(error = %e, "skipping unnormalizable reply"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping malformed thread entry"),
            }
        }

        if tweets.is_empty() {
            return Err(ScraperError::Normalization {
                post_id: conversation_id.to_owned(),
                reason: "conversation thread contains no readable posts".into(),
            });
        }

        // The focal post is the one whose id matches the conversation id;
        // quoted or promoted strays fall back to the first entry.
        let focal_idx = tweets
            .iter()
            .position(|t| t.post_id == conversation_id)
            .unwrap_or(0);
        let main_post = tweets.remove(focal_idx);

        Ok(ConversationThread {
            conversation_id: conversation_id.to_owned(),
            main_post,
            replies: tweets,
        })
    }

    /// Current transaction token, exposed for state inspection in tests.
    #[must_use]
    pub fn current_transaction_token(&self) -> &str {
        self.tx.current()
    }

    fn graphql_url(&self, path: &str, variables: &Value) -> Result<Url, ScraperError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("variables", &variables.to_string())
            .append_pair("features", FEATURES);
        Ok(url)
    }

    /// Paces, rotates the transaction token, sends the request with retry on
    /// transient errors, and parses the body as JSON.
    async fn request_json(&mut self, url: Url) -> Result<Value, ScraperError> {
        self.pace().await;
        let tx_id = self.tx.next()?;

        let max_retries = self.max_retries;
        let backoff_base_ms = self.retry_backoff_base_ms;
        let this = &*self;
        retry_with_backoff(max_retries, backoff_base_ms, || {
            let url = url.clone();
            let tx_id = tx_id.clone();
            async move { this.send_once(url, &tx_id).await }
        })
        .await
    }

    async fn send_once(&self, url: Url, tx_id: &str) -> Result<Value, ScraperError> {
        let cookie = format!(
            "auth_token={}; ct0={}; lang=en",
            self.auth_token, self.csrf_token
        );

        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.bearer_token),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::COOKIE, cookie)
            .header("x-csrf-token", &self.csrf_token)
            .header("x-client-transaction-id", tx_id)
            .header("x-twitter-active-user", "yes")
            .header("x-twitter-auth-type", "OAuth2Session")
            .header("x-twitter-client-language", "en")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: url.host_str().unwrap_or("x.com").to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ScraperError::AuthRejected {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Inserts the configured delay between successive API calls.
    async fn pace(&mut self) {
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < self.inter_request_delay {
                tokio::time::sleep(self.inter_request_delay - elapsed).await;
            }
        }
        self.last_request_at = Some(Instant::now());
    }
}
