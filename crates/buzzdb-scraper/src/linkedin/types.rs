//! Wire shapes for LinkedIn's Voyager content-search endpoint.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct VoyagerSearchResponse {
    #[serde(default)]
    pub elements: Vec<VoyagerUpdate>,
    #[serde(default)]
    pub paging: Option<VoyagerPaging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoyagerPaging {
    pub start: i64,
    pub count: i64,
    #[serde(default)]
    pub total: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoyagerUpdate {
    /// Activity URN, e.g. `urn:li:activity:7123456789012345678`.
    #[serde(default)]
    pub urn: Option<String>,
    #[serde(default)]
    pub commentary: Option<VoyagerText>,
    #[serde(default)]
    pub actor: Option<VoyagerActor>,
    #[serde(default)]
    pub social_detail: Option<VoyagerSocialDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoyagerText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoyagerActor {
    #[serde(default)]
    pub name: Option<VoyagerText>,
    /// Headline or company tagline.
    #[serde(default)]
    pub description: Option<VoyagerText>,
    /// Relative age of the post, e.g. `"5d"` or `"2w • Edited"`.
    #[serde(default)]
    pub sub_description: Option<VoyagerText>,
    #[serde(default)]
    pub navigation_url: Option<String>,
    #[serde(default)]
    pub follower_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoyagerSocialDetail {
    #[serde(default)]
    pub total_social_activity_counts: Option<VoyagerSocialCounts>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoyagerSocialCounts {
    #[serde(default)]
    pub num_likes: Option<i32>,
    #[serde(default)]
    pub num_comments: Option<i32>,
    #[serde(default)]
    pub num_shares: Option<i32>,
    #[serde(default)]
    pub num_impressions: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_search_response() {
        let json = r#"{
            "elements": [
                {
                    "urn": "urn:li:activity:7123456789012345678",
                    "commentary": { "text": "Rolled out UPI autopay support" },
                    "actor": {
                        "name": { "text": "Anita Rao" },
                        "description": { "text": "Fintech PM" },
                        "subDescription": { "text": "5d • Edited" },
                        "navigationUrl": "https://www.linkedin.com/in/anita-rao",
                        "followerCount": 3200
                    },
                    "socialDetail": {
                        "totalSocialActivityCounts": {
                            "numLikes": 41, "numComments": 6, "numShares": 2
                        }
                    }
                }
            ],
            "paging": { "start": 0, "count": 10, "total": 134 }
        }"#;

        let parsed: VoyagerSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.elements.len(), 1);
        let update = &parsed.elements[0];
        assert_eq!(
            update.urn.as_deref(),
            Some("urn:li:activity:7123456789012345678")
        );
        assert_eq!(
            update.actor.as_ref().unwrap().follower_count,
            Some(3200)
        );
        assert_eq!(parsed.paging.as_ref().unwrap().total, Some(134));
    }

    #[test]
    fn tolerates_sparse_elements() {
        let json = r#"{ "elements": [ { "urn": "urn:li:activity:1" } ] }"#;
        let parsed: VoyagerSearchResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.elements[0].commentary.is_none());
        assert!(parsed.paging.is_none());
    }
}
