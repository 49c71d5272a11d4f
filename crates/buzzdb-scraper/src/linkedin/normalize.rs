//! Normalization from Voyager update shapes to [`buzzdb_core::NormalizedPost`].

use chrono::{DateTime, Utc};
use serde_json::Value;

use buzzdb_core::{EngagementMetrics, NormalizedPost, Platform, PostAuthor};

use crate::error::ScraperError;
use crate::linkedin::types::VoyagerUpdate;
use crate::relative_time::parse_relative_time;

/// Extracts the numeric activity id from an URN like
/// `urn:li:activity:7123456789012345678`.
#[must_use]
pub fn post_id_from_urn(urn: &str) -> Option<String> {
    let id = urn.rsplit(':').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_owned())
    }
}

/// Normalizes a [`VoyagerUpdate`] into a [`NormalizedPost`], attaching `raw`
/// as the forensic payload.
///
/// `posted_at` is approximated from the relative age string ("5d"); it is
/// good enough for display and coarse filtering, which is all LinkedIn
/// ingestion uses it for.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] for updates without an URN or
/// without commentary text (nothing to classify).
pub fn normalize_update(
    update: &VoyagerUpdate,
    raw: Value,
    now: DateTime<Utc>,
) -> Result<NormalizedPost, ScraperError> {
    let urn = update
        .urn
        .as_deref()
        .ok_or_else(|| ScraperError::Normalization {
            post_id: "<missing-urn>".to_owned(),
            reason: "update has no urn".into(),
        })?;

    let post_id = post_id_from_urn(urn).ok_or_else(|| ScraperError::Normalization {
        post_id: urn.to_owned(),
        reason: "urn has no trailing id segment".into(),
    })?;

    let full_text = update
        .commentary
        .as_ref()
        .map(|c| c.text.clone())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ScraperError::Normalization {
            post_id: post_id.clone(),
            reason: "update has no commentary text".into(),
        })?;

    let actor = update.actor.as_ref();
    let author = PostAuthor {
        author_id: None,
        name: actor.and_then(|a| a.name.as_ref()).map(|t| t.text.clone()),
        username: None,
        description: actor
            .and_then(|a| a.description.as_ref())
            .map(|t| t.text.clone()),
        followers_count: None,
        following_count: None,
        connections_count: actor.and_then(|a| a.follower_count),
        is_verified: false,
        profile_url: actor.and_then(|a| a.navigation_url.clone()),
    };

    let counts = update
        .social_detail
        .as_ref()
        .and_then(|d| d.total_social_activity_counts.as_ref());
    let metrics = EngagementMetrics {
        likes: counts.and_then(|c| c.num_likes).unwrap_or(0),
        comments: counts.and_then(|c| c.num_comments).unwrap_or(0),
        shares: counts.and_then(|c| c.num_shares).unwrap_or(0),
        views: counts.and_then(|c| c.num_impressions),
    };

    let posted_at = actor
        .and_then(|a| a.sub_description.as_ref())
        .and_then(|t| parse_relative_time(&t.text, now));

    Ok(NormalizedPost {
        platform: Platform::Linkedin,
        post_id: post_id.clone(),
        full_text,
        language: None,
        author,
        metrics,
        post_url: Some(format!(
            "https://www.linkedin.com/feed/update/urn:li:activity:{post_id}"
        )),
        is_reply: false,
        conversation_id: None,
        media_urls: vec![],
        posted_at,
        payload: raw,
    })
}
