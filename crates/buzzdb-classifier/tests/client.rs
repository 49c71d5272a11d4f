//! Integration tests for `ClassifierClient` using wiremock HTTP mocks.

use buzzdb_classifier::{
    build_system_prompt, ClassifierClient, ClassifierConfig, ClassifierError, ClassifyInput,
};
use buzzdb_core::Category;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ClassifierClient {
    let config = ClassifierConfig {
        endpoint: base_url.to_owned(),
        deployment: "gpt-test".to_owned(),
        api_version: "2025-01-01-preview".to_owned(),
        api_key: "test-key".to_owned(),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_ms: 0,
    };
    let prompt = build_system_prompt("Razorpay", &["Payment Gateway".to_string()]);
    ClassifierClient::new(&config, prompt).expect("client construction should not fail")
}

fn input(text: &str) -> ClassifyInput {
    ClassifyInput {
        text: text.to_owned(),
        image_url: None,
    }
}

fn judgment_json() -> serde_json::Value {
    json!({
        "is_spam": false,
        "spam_reason": null,
        "category": "Experience Breakage",
        "product": "Payment Gateway",
        "sentiment_score": 2,
        "urgency_score": 9,
        "impact_score": 8,
        "summary": "Checkout failing for three days",
        "key_issues": ["payment failure"],
        "suggested_action": "Escalate to payments on-call"
    })
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ],
        "usage": { "prompt_tokens": 480, "completion_tokens": 120, "total_tokens": 600 }
    })
}

#[tokio::test]
async fn classify_parses_judgment_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .and(query_param("api-version", "2025-01-01-preview"))
        .and(header("api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(&judgment_json().to_string())),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let outcome = client
        .classify(&input("checkout keeps failing"))
        .await
        .expect("classification should succeed");

    assert!(!outcome.judgment.is_spam);
    assert_eq!(
        outcome.judgment.category,
        Some(Category::ExperienceBreakage)
    );
    assert_eq!(outcome.judgment.urgency_score, Some(9));
    assert_eq!(outcome.usage.total_tokens, Some(600));
}

#[tokio::test]
async fn classify_unwraps_fenced_json() {
    let server = MockServer::start().await;

    let fenced = format!("```json\n{}\n```", judgment_json());
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&fenced)))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let outcome = client.classify(&input("text")).await.unwrap();
    assert_eq!(
        outcome.judgment.category,
        Some(Category::ExperienceBreakage)
    );
}

#[tokio::test]
async fn spam_judgment_carries_no_category() {
    let server = MockServer::start().await;

    let spam = json!({
        "is_spam": true,
        "spam_reason": "giveaway link farm",
        "category": null,
        "sentiment_score": 5,
        "urgency_score": 1,
        "impact_score": 1,
        "summary": "Spam",
        "key_issues": [],
        "suggested_action": "Ignore"
    });

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&spam.to_string())))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let outcome = client.classify(&input("WIN FREE CRYPTO")).await.unwrap();
    assert!(outcome.judgment.is_spam);
    assert!(outcome.judgment.category.is_none());
}

#[tokio::test]
async fn http_error_surfaces_as_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.classify(&input("text")).await.unwrap_err();
    assert!(matches!(err, ClassifierError::Status { status: 400, .. }));
}

#[tokio::test]
async fn malformed_judgment_surfaces_as_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("I'm sorry, I can't classify this.")),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.classify(&input("text")).await.unwrap_err();
    assert!(matches!(err, ClassifierError::Parse { .. }));
}

#[tokio::test]
async fn empty_choices_surface_as_missing_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.classify(&input("text")).await.unwrap_err();
    assert!(matches!(err, ClassifierError::MissingContent));
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;

    // First call fails with 503, second succeeds.
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-test/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(&judgment_json().to_string())),
        )
        .mount(&server)
        .await;

    let config = ClassifierConfig {
        endpoint: server.uri(),
        deployment: "gpt-test".to_owned(),
        api_version: "2025-01-01-preview".to_owned(),
        api_key: "test-key".to_owned(),
        request_timeout_secs: 5,
        max_retries: 2,
        retry_backoff_base_ms: 0,
    };
    let client = ClassifierClient::new(&config, build_system_prompt("Razorpay", &[])).unwrap();

    let outcome = client.classify(&input("text")).await.unwrap();
    assert_eq!(
        outcome.judgment.category,
        Some(Category::ExperienceBreakage)
    );
}
