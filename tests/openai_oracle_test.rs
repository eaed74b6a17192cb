//! OpenAI oracle against a mock chat completions endpoint

use sheetguard::adapters::oracle::{ClassificationOracle, OpenAiOracle};
use sheetguard::anonymization::models::{Category, ColumnProfile, VerdictProvenance};
use sheetguard::anonymization::{Classifier, ClassifierSettings};
use sheetguard::config::{secret_string, OracleConfig, RetryConfig};
use sheetguard::domain::{OracleError, ScalarKind};
use std::sync::Arc;

const ENDPOINT: &str = "/v1/chat/completions";

fn config(base_url: String) -> OracleConfig {
    OracleConfig {
        base_url,
        api_key: Some(secret_string("sk-test".to_string())),
        timeout_seconds: 5,
        retry: RetryConfig {
            max_retries: 1,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        },
        ..OracleConfig::default()
    }
}

fn profile() -> ColumnProfile {
    ColumnProfile {
        name: "CPF".to_string(),
        kind: ScalarKind::Text,
        sample: vec!["123.456.789-09".to_string(), "987.654.321-00".to_string()],
        non_null: 2,
    }
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_successful_classification() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .match_header("authorization", "Bearer sk-test")
        .match_body(mockito::Matcher::Regex("123.456.789-09".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            r#"{"category": "identifier", "sensitive": true, "rationale": "CPF numbers"}"#,
        ))
        .create_async()
        .await;

    let oracle = OpenAiOracle::new(&config(server.url())).unwrap();
    let answer = oracle.classify(&profile()).await.unwrap();

    assert!(answer.contains("identifier"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let cases = [
        (429, "rate_limited"),
        (500, "server_error"),
        (503, "server_error"),
        (400, "client_error"),
        (401, "client_error"),
    ];

    for (status, expected) in cases {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", ENDPOINT)
            .with_status(status)
            .with_body("{\"error\": \"nope\"}")
            .create_async()
            .await;

        let oracle = OpenAiOracle::new(&config(server.url())).unwrap();
        let error = oracle.classify(&profile()).await.unwrap_err();

        let kind = match &error {
            OracleError::RateLimited(_) => "rate_limited",
            OracleError::ServerError { status: s, .. } if *s == status as u16 => "server_error",
            OracleError::ClientError { status: s, .. } if *s == status as u16 => "client_error",
            _ => "other",
        };
        assert_eq!(kind, expected, "status {status} mapped to {error:?}");
    }
}

#[tokio::test]
async fn test_empty_content_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("   "))
        .create_async()
        .await;

    let oracle = OpenAiOracle::new(&config(server.url())).unwrap();
    let error = oracle.classify(&profile()).await.unwrap_err();

    assert!(matches!(error, OracleError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_non_json_envelope_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let oracle = OpenAiOracle::new(&config(server.url())).unwrap();
    let error = oracle.classify(&profile()).await.unwrap_err();

    assert!(matches!(error, OracleError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_failure() {
    // Nothing listens on port 9 of the loopback interface
    let oracle = OpenAiOracle::new(&config("http://127.0.0.1:9".to_string())).unwrap();
    let error = oracle.classify(&profile()).await.unwrap_err();

    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_classifier_retries_rate_limited_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .with_status(429)
        .with_body("too many requests")
        .expect(2)
        .create_async()
        .await;

    let config = config(server.url());
    let oracle = Arc::new(OpenAiOracle::new(&config).unwrap());
    let classifier = Classifier::new(oracle, ClassifierSettings::from_config(&config));

    let verdict = classifier.classify(&profile()).await;

    assert_eq!(verdict.provenance, VerdictProvenance::Unclassified);
    assert_eq!(verdict.category, Category::NonSensitive);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_classifier_parses_portuguese_completion() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            "```json\n{\"tipo_coluna\": \"identificador\", \"eh_sensivel\": \"sim\", \"explicacao\": \"CPF\"}\n```",
        ))
        .create_async()
        .await;

    let config = config(server.url());
    let oracle = Arc::new(OpenAiOracle::new(&config).unwrap());
    let classifier = Classifier::new(oracle, ClassifierSettings::from_config(&config));

    let verdict = classifier.classify(&profile()).await;

    assert_eq!(verdict.category, Category::Identifier);
    assert!(verdict.sensitive);
    assert_eq!(verdict.rationale, "CPF");
}
