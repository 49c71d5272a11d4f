//! LinkedIn source adapter over the Voyager content-search endpoint.
//!
//! LinkedIn only reports relative post ages, so this adapter has no
//! time-window mode: ingestion runs as keyword sweeps with offset
//! pagination, deduped by natural key in storage and pre-filtered by the
//! adapter state file across processes.

mod normalize;
pub mod types;

pub use normalize::{normalize_update, post_id_from_urn};

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use serde_json::Value;
use tokio::time::Instant;

use buzzdb_core::NormalizedPost;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::state::AdapterStateFile;
use crate::types::SearchPage;

const DEFAULT_BASE_URL: &str = "https://www.linkedin.com/";
const SEARCH_PATH: &str = "voyager/api/search/content";
const PAGE_SIZE: i64 = 10;

/// Construction parameters for [`LinkedinClient`].
#[derive(Debug, Clone)]
pub struct LinkedinConfig {
    pub li_at: String,
    pub jsessionid: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

/// LinkedIn content-search client.
pub struct LinkedinClient {
    client: Client,
    base_url: Url,
    li_at: String,
    jsessionid: String,
    inter_request_delay: Duration,
    last_request_at: Option<Instant>,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl LinkedinClient {
    /// Creates a client pointed at the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: LinkedinConfig) -> Result<Self, ScraperError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] for an unparseable base URL,
    /// or [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(config: LinkedinConfig, base_url: &str) -> Result<Self, ScraperError> {
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

        Ok(Self {
            client,
            base_url,
            li_at: config.li_at,
            jsessionid: config.jsessionid,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            last_request_at: None,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Fetches one page of keyword search results starting at offset `start`.
    ///
    /// The returned cursor is the next page's offset, or `None` when the
    /// page came back empty or short.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after retries exhausted.
    /// - [`ScraperError::AuthRejected`] — 401/403 (expired cookies).
    /// - [`ScraperError::UnexpectedStatus`] / [`ScraperError::Http`] — other
    ///   failures after retries.
    /// - [`ScraperError::Deserialize`] — body is not valid JSON.
    pub async fn search_page(
        &mut self,
        keywords: &str,
        start: i64,
    ) -> Result<SearchPage, ScraperError> {
        let mut url = self
            .base_url
            .join(SEARCH_PATH)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                url: format!("{}{SEARCH_PATH}", self.base_url),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("keywords", keywords)
            .append_pair("origin", "GLOBAL_SEARCH_HEADER")
            .append_pair("start", &start.to_string())
            .append_pair("count", &PAGE_SIZE.to_string());

        let body = self.request_json(url).await?;

        let now = Utc::now();
        let mut posts: Vec<NormalizedPost> = Vec::new();
        let mut parse_errors = 0usize;

        let elements = body
            .get("elements")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let element_count = elements.len();

        for raw in elements {
            let update = match serde_json::from_value::<types::VoyagerUpdate>(raw.clone()) {
                Ok(update) => update,
                Err(e) => {
                    parse_errors += 1;
                    tracing::warn!(error = %e, "skipping malformed voyager element");
                    continue;
                }
            };
            match normalize_update(&update, raw, now) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    parse_errors += 1;
                    tracing::debug!(error = %e, "skipping unnormalizable update");
                }
            }
        }

        let next_cursor = if element_count < usize::try_from(PAGE_SIZE).unwrap_or(usize::MAX) {
            None
        } else {
            Some((start + PAGE_SIZE).to_string())
        };

        Ok(SearchPage {
            posts,
            next_cursor,
            parse_errors,
        })
    }

    /// Sweeps up to `max_posts` posts for a keyword, skipping ids already
    /// recorded in the adapter state file and rewriting the file after each
    /// page.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::search_page`] or the state file.
    pub async fn sweep(
        &mut self,
        keywords: &str,
        max_posts: usize,
        state_file: &AdapterStateFile,
    ) -> Result<Vec<NormalizedPost>, ScraperError> {
        let mut state = state_file.load()?;
        state.begin_run(keywords, Utc::now());

        let mut collected: Vec<NormalizedPost> = Vec::new();
        let mut start = 0i64;

        'pages: loop {
            let page = self.search_page(keywords, start).await?;
            let has_more = page.next_cursor.is_some();

            for post in page.posts {
                if collected.len() >= max_posts {
                    // Posts past the cap are left unmarked so a later sweep
                    // still picks them up.
                    break;
                }
                if state.was_processed(&post.post_id) {
                    tracing::debug!(post_id = %post.post_id, "already in adapter state, skipping");
                    continue;
                }
                state.mark_processed(&post.post_id);
                collected.push(post);
            }

            state_file.save(&state)?;

            if collected.len() >= max_posts || !has_more {
                break 'pages;
            }
            start += PAGE_SIZE;
        }

        Ok(collected)
    }

    async fn request_json(&mut self, url: Url) -> Result<Value, ScraperError> {
        self.pace().await;

        let max_retries = self.max_retries;
        let backoff_base_ms = self.retry_backoff_base_ms;
        let this = &*self;
        retry_with_backoff(max_retries, backoff_base_ms, || {
            let url = url.clone();
            async move { this.send_once(url).await }
        })
        .await
    }

    async fn send_once(&self, url: Url) -> Result<Value, ScraperError> {
        // Voyager expects the JSESSIONID value (quoted in the cookie) echoed
        // back bare in the csrf-token header.
        let csrf = self.jsessionid.trim_matches('"');
        let cookie = format!(
            "li_at={}; JSESSIONID=\"{}\"; lang=v=2&lang=en-us",
            self.li_at, csrf
        );

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.linkedin.normalized+json+2.1")
            .header(reqwest::header::COOKIE, cookie)
            .header("csrf-token", csrf)
            .header("x-restli-protocol-version", "2.0.0")
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
                domain: url.host_str().unwrap_or("linkedin.com").to_owned(),
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
