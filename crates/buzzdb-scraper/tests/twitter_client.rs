//! Integration tests for the Twitter adapter using wiremock HTTP mocks.

use buzzdb_scraper::{MemoryTokenStore, ScraperError, TwitterClient, TwitterConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> TwitterConfig {
    TwitterConfig {
        auth_token: "test-auth".to_owned(),
        csrf_token: "test-csrf".to_owned(),
        bearer_token: None,
        transaction_seed: Some("txseed0".to_owned()),
        user_agent: "buzzdb-test/0.1".to_owned(),
        request_timeout_secs: 5,
        inter_request_delay_ms: 0,
        max_retries: 0,
        retry_backoff_base_ms: 0,
    }
}

fn test_client(base_url: &str) -> TwitterClient<MemoryTokenStore> {
    TwitterClient::with_base_url(test_config(), MemoryTokenStore::default(), base_url)
        .expect("client construction should not fail")
}

fn tweet_entry(id: &str, text: &str, conversation_id: &str) -> serde_json::Value {
    json!({
        "entryId": format!("tweet-{id}"),
        "content": {
            "entryType": "TimelineTimelineItem",
            "itemContent": {
                "itemType": "TimelineTweet",
                "tweet_results": {
                    "result": {
                        "rest_id": id,
                        "core": {
                            "user_results": {
                                "result": {
                                    "rest_id": "42",
                                    "legacy": {
                                        "name": "Test User",
                                        "screen_name": "testuser",
                                        "followers_count": 100,
                                        "friends_count": 50,
                                        "verified": false
                                    }
                                }
                            }
                        },
                        "legacy": {
                            "full_text": text,
                            "created_at": "Tue Dec 16 06:31:32 +0000 2025",
                            "conversation_id_str": conversation_id,
                            "favorite_count": 1,
                            "reply_count": 0,
                            "retweet_count": 0,
                            "quote_count": 0,
                            "lang": "en"
                        }
                    }
                }
            }
        }
    })
}

fn search_body(entries: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "data": {
            "search_by_raw_query": {
                "search_timeline": {
                    "timeline": {
                        "instructions": [
                            { "type": "TimelineAddEntries", "entries": entries }
                        ]
                    }
                }
            }
        }
    })
}

#[tokio::test]
async fn search_page_parses_tweets_and_cursor() {
    let server = MockServer::start().await;

    let body = search_body(vec![
        tweet_entry("1001", "Razorpay checkout is down", "1001"),
        tweet_entry("1002", "loving the new dashboard", "1002"),
        json!({
            "entryId": "cursor-bottom-1",
            "content": {
                "entryType": "TimelineTimelineCursor",
                "cursorType": "Bottom",
                "value": "next-page-cursor"
            }
        }),
    ]);

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/bshMIjqDk8LTXTq4w91WKw/SearchTimeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let page = client
        .search_page("Razorpay", 1_700_000_000, 1_700_001_800, None)
        .await
        .expect("search should succeed");

    assert_eq!(page.posts.len(), 2);
    assert_eq!(page.posts[0].post_id, "1001");
    assert_eq!(page.posts[0].author.username.as_deref(), Some("testuser"));
    assert_eq!(page.next_cursor.as_deref(), Some("next-page-cursor"));
    assert_eq!(page.parse_errors, 0);
}

#[tokio::test]
async fn empty_page_clears_cursor() {
    let server = MockServer::start().await;

    // Exhausted timelines still return a bottom cursor; the adapter must
    // not offer it back to the pagination loop.
    let body = search_body(vec![json!({
        "entryId": "cursor-bottom-1",
        "content": {
            "entryType": "TimelineTimelineCursor",
            "cursorType": "Bottom",
            "value": "still-here"
        }
    })]);

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/bshMIjqDk8LTXTq4w91WKw/SearchTimeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let page = client
        .search_page("Razorpay", 0, 100, None)
        .await
        .unwrap();

    assert!(page.posts.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn rate_limit_surfaces_as_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/bshMIjqDk8LTXTq4w91WKw/SearchTimeline"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let err = client
        .search_page("Razorpay", 0, 100, None)
        .await
        .unwrap_err();

    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => assert_eq!(retry_after_secs, 120),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn expired_credentials_surface_as_auth_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/bshMIjqDk8LTXTq4w91WKw/SearchTimeline"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let err = client
        .search_page("Razorpay", 0, 100, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::AuthRejected { status: 401, .. }));
}

#[tokio::test]
async fn transaction_token_rotates_per_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![])))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    assert_eq!(client.current_transaction_token(), "txseed0");

    client.search_page("q", 0, 100, None).await.unwrap();
    assert_eq!(client.current_transaction_token(), "txseed1");

    client.search_page("q", 0, 100, None).await.unwrap();
    assert_eq!(client.current_transaction_token(), "txseed2");
}

#[tokio::test]
async fn fetch_conversation_splits_focal_post_and_replies() {
    let server = MockServer::start().await;

    let body = json!({
        "data": {
            "threaded_conversation_with_injections_v2": {
                "instructions": [
                    {
                        "type": "TimelineAddEntries",
                        "entries": [
                            tweet_entry("2001", "payments failing at checkout", "2001"),
                            tweet_entry("2002", "same issue here", "2001"),
                            tweet_entry("2003", "support hasn't replied", "2001")
                        ]
                    }
                ]
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/nBS-WpgA6ZG0CyNHD517JQ/TweetDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let thread = client
        .fetch_conversation("2001")
        .await
        .expect("conversation fetch should succeed");

    assert_eq!(thread.conversation_id, "2001");
    assert_eq!(thread.main_post.post_id, "2001");
    assert_eq!(thread.replies.len(), 2);
    assert_eq!(thread.reply_count(), 2);
}

#[tokio::test]
async fn empty_conversation_is_a_normalization_error() {
    let server = MockServer::start().await;

    let body = json!({
        "data": { "threaded_conversation_with_injections_v2": { "instructions": [] } }
    });

    Mock::given(method("GET"))
        .and(path("/i/api/graphql/nBS-WpgA6ZG0CyNHD517JQ/TweetDetail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let mut client = test_client(&server.uri());
    let err = client.fetch_conversation("999").await.unwrap_err();
    assert!(matches!(err, ScraperError::Normalization { .. }));
}
