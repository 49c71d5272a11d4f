//! Wire shapes for the Twitter/X GraphQL timeline endpoints.
//!
//! Only the fields the normalizer needs are modeled; each timeline entry's
//! raw JSON is carried alongside the typed view so the original payload is
//! preserved verbatim for forensics.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScraperError;

#[derive(Debug, Clone, Deserialize)]
pub struct TweetResult {
    pub rest_id: String,
    #[serde(default)]
    pub core: Option<UserCore>,
    #[serde(default)]
    pub views: Option<Views>,
    #[serde(default)]
    pub legacy: Option<TweetLegacy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetLegacy {
    pub full_text: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub conversation_id_str: Option<String>,
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default)]
    pub favorite_count: i32,
    #[serde(default)]
    pub reply_count: i32,
    #[serde(default)]
    pub retweet_count: i32,
    #[serde(default)]
    pub quote_count: i32,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub entities: Option<TweetEntities>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub media: Option<Vec<MediaEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaEntity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub media_url_https: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Views {
    #[serde(default)]
    pub count: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCore {
    pub user_results: UserResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResults {
    #[serde(default)]
    pub result: Option<UserResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResult {
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub legacy: Option<UserLegacy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLegacy {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i32>,
    #[serde(default)]
    pub friends_count: Option<i32>,
    #[serde(default)]
    pub verified: bool,
}

/// Flattens `SearchTimeline` response instructions into their raw entries.
#[must_use]
pub fn search_entries(body: &Value) -> Vec<Value> {
    let instructions = body
        .pointer("/data/search_by_raw_query/search_timeline/timeline/instructions")
        .and_then(Value::as_array);
    flatten_instruction_entries(instructions)
}

/// Flattens `TweetDetail` (threaded conversation) instructions into entries.
#[must_use]
pub fn conversation_entries(body: &Value) -> Vec<Value> {
    let instructions = body
        .pointer("/data/threaded_conversation_with_injections_v2/instructions")
        .and_then(Value::as_array);
    flatten_instruction_entries(instructions)
}

fn flatten_instruction_entries(instructions: Option<&Vec<Value>>) -> Vec<Value> {
    let mut entries = Vec::new();
    for instruction in instructions.into_iter().flatten() {
        if instruction.get("type").and_then(Value::as_str) != Some("TimelineAddEntries") {
            continue;
        }
        if let Some(batch) = instruction.get("entries").and_then(Value::as_array) {
            entries.extend(batch.iter().cloned());
        }
    }
    entries
}

/// Extracts the tweet from a timeline entry, returning the typed view and
/// the raw `tweet_results.result` payload. Non-tweet entries (cursors,
/// modules, tombstones) return `None`.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] when an entry looks like a tweet
/// but does not match the expected shape.
pub fn entry_tweet(entry: &Value) -> Result<Option<(TweetResult, Value)>, ScraperError> {
    let Some(result) = entry
        .pointer("/content/itemContent/tweet_results/result")
        .or_else(|| entry.pointer("/content/items/0/item/itemContent/tweet_results/result"))
    else {
        return Ok(None);
    };

    let entry_id = entry
        .get("entryId")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>");

    let tweet: TweetResult =
        serde_json::from_value(result.clone()).map_err(|e| ScraperError::Deserialize {
            context: format!("timeline entry {entry_id}"),
            source: e,
        })?;

    Ok(Some((tweet, result.clone())))
}

/// Extracts the bottom pagination cursor from a timeline entry, if this
/// entry is one.
#[must_use]
pub fn entry_cursor_bottom(entry: &Value) -> Option<String> {
    let content = entry.get("content")?;
    if content.get("entryType").and_then(Value::as_str) != Some("TimelineTimelineCursor") {
        return None;
    }
    if content.get("cursorType").and_then(Value::as_str) != Some("Bottom") {
        return None;
    }
    content
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
