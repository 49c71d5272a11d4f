//! Adapter output types shared by the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use buzzdb_core::NormalizedPost;

/// One page of search results plus the opaque continuation cursor, if any.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub posts: Vec<NormalizedPost>,
    pub next_cursor: Option<String>,
    /// Entries on this page that could not be parsed and were skipped.
    pub parse_errors: usize,
}

/// A full conversation thread: the focal post plus its replies.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationThread {
    pub conversation_id: String,
    pub main_post: NormalizedPost,
    pub replies: Vec<NormalizedPost>,
}

impl ConversationThread {
    #[must_use]
    pub fn reply_count(&self) -> i32 {
        i32::try_from(self.replies.len()).unwrap_or(i32::MAX)
    }

    /// When the focal post was published, if the platform reported it.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.main_post.posted_at
    }

    /// Latest activity in the thread: the newest reply timestamp, falling
    /// back to the focal post's own timestamp for reply-less threads.
    #[must_use]
    pub fn last_reply_at(&self) -> Option<DateTime<Utc>> {
        self.replies
            .iter()
            .filter_map(|r| r.posted_at)
            .max()
            .or_else(|| self.started_at())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzdb_core::{EngagementMetrics, Platform, PostAuthor};
    use chrono::TimeZone;

    fn post(id: &str, posted_at: Option<DateTime<Utc>>) -> NormalizedPost {
        NormalizedPost {
            platform: Platform::Twitter,
            post_id: id.to_owned(),
            full_text: "text".to_owned(),
            language: None,
            author: PostAuthor::default(),
            metrics: EngagementMetrics::default(),
            post_url: None,
            is_reply: false,
            conversation_id: Some("c1".to_owned()),
            media_urls: vec![],
            posted_at,
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn last_reply_at_prefers_newest_reply() {
        let t0 = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 12, 2, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 12, 3, 0, 0, 0).unwrap();

        let thread = ConversationThread {
            conversation_id: "c1".to_owned(),
            main_post: post("1", Some(t0)),
            replies: vec![post("2", Some(t2)), post("3", Some(t1))],
        };

        assert_eq!(thread.reply_count(), 2);
        assert_eq!(thread.started_at(), Some(t0));
        assert_eq!(thread.last_reply_at(), Some(t2));
    }

    #[test]
    fn last_reply_at_falls_back_to_main_post() {
        let t0 = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        let thread = ConversationThread {
            conversation_id: "c1".to_owned(),
            main_post: post("1", Some(t0)),
            replies: vec![],
        };
        assert_eq!(thread.last_reply_at(), Some(t0));
    }
}
