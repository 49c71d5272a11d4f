//! Normalization from Twitter wire shapes to [`buzzdb_core::NormalizedPost`].

use chrono::{DateTime, Utc};
use serde_json::Value;

use buzzdb_core::{EngagementMetrics, NormalizedPost, Platform, PostAuthor};

use crate::error::ScraperError;
use crate::twitter::types::TweetResult;

/// Twitter's legacy timestamp format: `"Tue Dec 16 06:31:32 +0000 2025"`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parses a Twitter `created_at` string into UTC.
#[must_use]
pub fn parse_twitter_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalizes a [`TweetResult`] into a [`NormalizedPost`], attaching `raw`
/// as the forensic payload.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the tweet has no `legacy`
/// block (withheld/tombstoned results carry none and cannot be stored as
/// posts).
pub fn normalize_tweet(tweet: &TweetResult, raw: Value) -> Result<NormalizedPost, ScraperError> {
    let legacy = tweet
        .legacy
        .as_ref()
        .ok_or_else(|| ScraperError::Normalization {
            post_id: tweet.rest_id.clone(),
            reason: "tweet result has no legacy payload".into(),
        })?;

    let user = tweet
        .core
        .as_ref()
        .and_then(|core| core.user_results.result.as_ref());
    let user_legacy = user.and_then(|u| u.legacy.as_ref());
    let screen_name = user_legacy.and_then(|u| u.screen_name.clone());

    let author = PostAuthor {
        author_id: user.and_then(|u| u.rest_id.clone()),
        name: user_legacy.and_then(|u| u.name.clone()),
        username: screen_name.clone(),
        description: user_legacy.and_then(|u| u.description.clone()),
        followers_count: user_legacy.and_then(|u| u.followers_count),
        following_count: user_legacy.and_then(|u| u.friends_count),
        connections_count: None,
        is_verified: user_legacy.is_some_and(|u| u.verified),
        profile_url: screen_name.as_deref().map(|s| format!("https://x.com/{s}")),
    };

    let metrics = EngagementMetrics {
        likes: legacy.favorite_count,
        comments: legacy.reply_count,
        shares: legacy.retweet_count + legacy.quote_count,
        views: tweet
            .views
            .as_ref()
            .and_then(|v| v.count.as_deref())
            .and_then(|c| c.parse::<i64>().ok()),
    };

    let media_urls: Vec<String> = legacy
        .entities
        .as_ref()
        .and_then(|e| e.media.as_ref())
        .map(|media| {
            media
                .iter()
                .filter(|m| m.kind == "photo")
                .filter_map(|m| m.media_url_https.clone())
                .collect()
        })
        .unwrap_or_default();

    let post_url = screen_name
        .as_deref()
        .map(|s| format!("https://x.com/{s}/status/{}", tweet.rest_id));

    Ok(NormalizedPost {
        platform: Platform::Twitter,
        post_id: tweet.rest_id.clone(),
        full_text: legacy.full_text.clone(),
        language: legacy.lang.clone(),
        author,
        metrics,
        post_url,
        is_reply: legacy.in_reply_to_status_id_str.is_some(),
        conversation_id: legacy.conversation_id_str.clone(),
        media_urls,
        posted_at: legacy.created_at.as_deref().and_then(parse_twitter_timestamp),
        payload: raw,
    })
}
