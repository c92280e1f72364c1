//! Wire-level tests for the Azure adapters against a local HTTP mock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use kupah_azure::{
    AzureChatClient, AzureEmbeddingsClient, AzureError, AzureOpenAiConfig, ChatClient,
    ChatOptions, EmbeddingsClient, TelemetryHooks,
};
use kupah_core::Message;

fn config_for(server: &MockServer) -> AzureOpenAiConfig {
    AzureOpenAiConfig {
        endpoint: server.base_url(),
        api_key: "test-key".into(),
        api_version: "2024-10-21".into(),
        chat_deployment: "chat-dep".into(),
        embeddings_deployment: "embed-dep".into(),
        request_timeout: Duration::from_secs(5),
        max_retries: 2,
        backoff_base: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn chat_sends_json_mode_and_returns_content() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/chat-dep/chat/completions")
                .query_param("api-version", "2024-10-21")
                .header("api-key", "test-key")
                .json_body_partial(r#"{"response_format": {"type": "json_object"}}"#);
            then.status(200).json_body(json!({
                "choices": [
                    {"message": {"content": "{\"assistant_say\":\"שלום\",\"profile_patch\":{},\"status\":\"ASKING\"}"}}
                ]
            }));
        })
        .await;

    let client = AzureChatClient::new(config_for(&server)).unwrap();
    let messages = vec![Message::system("prompt"), Message::user("שלום")];
    let out = client
        .chat(&messages, &ChatOptions::json(350))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(out.contains("assistant_say"));
}

#[tokio::test]
async fn chat_retries_on_rate_limit_then_fails_with_upstream_error() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/chat-dep/chat/completions");
            then.status(429).body("busy");
        })
        .await;

    let client = AzureChatClient::new(config_for(&server)).unwrap();
    let err = client
        .chat(&[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AzureError::RateLimited(_)));
    // Initial attempt plus max_retries re-attempts.
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn chat_does_not_retry_client_errors() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/chat-dep/chat/completions");
            then.status(400).body("bad request");
        })
        .await;

    let client = AzureChatClient::new(config_for(&server)).unwrap();
    let err = client
        .chat(&[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AzureError::Api { status: 400, .. }));
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn embeddings_batch_and_preserve_order() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/embed-dep/embeddings")
                .json_body(json!({"input": ["a", "b"]}));
            then.status(200).json_body(json!({
                "data": [
                    {"embedding": [1.0, 2.0]},
                    {"embedding": [3.0, 4.0]}
                ]
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/embed-dep/embeddings")
                .json_body(json!({"input": ["c"]}));
            then.status(200).json_body(json!({
                "data": [{"embedding": [5.0, 6.0]}]
            }));
        })
        .await;

    let client = AzureEmbeddingsClient::new(config_for(&server)).unwrap();
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = client.embed_texts(&texts, 2).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(
        vectors,
        vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
    );
}

#[tokio::test]
async fn success_hook_fires_once_per_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/chat-dep/chat/completions");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": "תשובה"}}]}));
        })
        .await;

    let results = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&results);
    let hooks = TelemetryHooks {
        on_result: Some(Arc::new(move |event, _| {
            assert_eq!(event, "azure.chat.success");
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        on_error: None,
    };

    let client = AzureChatClient::new(config_for(&server))
        .unwrap()
        .with_hooks(hooks);
    let out = client
        .chat(&[Message::user("מה שלומך?")], &ChatOptions::text(600))
        .await
        .unwrap();

    assert_eq!(out, "תשובה");
    assert_eq!(results.load(Ordering::SeqCst), 1);
}
