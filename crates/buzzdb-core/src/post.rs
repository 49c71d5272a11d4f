//! Canonical, platform-agnostic shape of one scraped social post.
//!
//! Source adapters normalize their wire payloads into [`NormalizedPost`]
//! before anything downstream (persistence, classification) sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform a post was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitter" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Author identity and reach metrics as reported by the platform.
///
/// Twitter reports follower/following counts; LinkedIn reports connection
/// counts. Fields the platform does not expose stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostAuthor {
    pub author_id: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub description: Option<String>,
    pub followers_count: Option<i32>,
    pub following_count: Option<i32>,
    pub connections_count: Option<i32>,
    pub is_verified: bool,
    pub profile_url: Option<String>,
}

/// Engagement counters at scrape time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub likes: i32,
    pub comments: i32,
    pub shares: i32,
    pub views: Option<i64>,
}

/// One canonicalized scraped item.
///
/// `(platform, post_id)` is the natural key used for deduplication across
/// runs. `payload` retains the adapter's raw wire entry for forensics and
/// replay; everything else is normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub platform: Platform,
    pub post_id: String,
    pub full_text: String,
    pub language: Option<String>,
    pub author: PostAuthor,
    pub metrics: EngagementMetrics,
    pub post_url: Option<String>,
    pub is_reply: bool,
    pub conversation_id: Option<String>,
    pub media_urls: Vec<String>,
    /// Platform-reported creation time. `None` when the platform only
    /// exposes relative timestamps ("5d ago"), which are too approximate
    /// for anything durability-critical.
    pub posted_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}
