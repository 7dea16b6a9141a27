//! Chat completions contract tests against a mock server.
//!
//! The client is blocking, so every call runs on the blocking pool while
//! the mock server keeps serving on the test runtime.

use mizuna::AssistantError;
use mizuna::config::LlmConfig;
use mizuna::llm::{ChatCompletionsClient, ChatMessage, LanguageModel, ResponseGenerator};
use mizuna::memory::MemoryRecord;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_url: server.uri(),
        api_key: "test-key".to_owned(),
        ..LlmConfig::default()
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "openai/gpt-oss-20b",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn request_carries_model_sampling_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-oss-20b",
            "temperature": 0.3,
            "top_p": 0.9,
            "max_tokens": 200,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let reply = tokio::task::spawn_blocking(move || {
        let client = ChatCompletionsClient::new(&config)?;
        client.complete(&[ChatMessage::system("persona"), ChatMessage::user("hello")])
    })
    .await
    .expect("join");

    assert_eq!(reply.expect("completion"), "Hi there");
}

#[tokio::test]
async fn generator_sends_persona_memory_then_utterance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Your rover!")))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let reply = tokio::task::spawn_blocking(move || {
        let client = ChatCompletionsClient::new(&config)?;
        let generator = ResponseGenerator::new(Box::new(client), "persona");
        let memory = [MemoryRecord::new("Rover", "Built a rover", "")];
        generator.generate("how is my project", &memory)
    })
    .await
    .expect("join");
    assert_eq!(reply.expect("reply"), "Your rover!");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], json!({"role": "system", "content": "persona"}));
    assert_eq!(messages[1]["role"], "system");
    assert_eq!(
        messages[2],
        json!({"role": "user", "content": "how is my project"})
    );
}

#[tokio::test]
async fn server_error_is_generation_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = tokio::task::spawn_blocking(move || {
        let client = ChatCompletionsClient::new(&config)?;
        client.complete(&[ChatMessage::user("hello")])
    })
    .await
    .expect("join");

    match result {
        Err(AssistantError::GenerationUnavailable(detail)) => {
            assert!(detail.contains("503"), "{detail}");
            assert!(detail.contains("over capacity"), "{detail}");
        }
        other => panic!("expected GenerationUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_are_generation_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = tokio::task::spawn_blocking(move || {
        let client = ChatCompletionsClient::new(&config)?;
        client.complete(&[ChatMessage::user("hello")])
    })
    .await
    .expect("join");

    assert!(matches!(
        result,
        Err(AssistantError::GenerationUnavailable(_))
    ));
}

#[tokio::test]
async fn unreachable_server_is_generation_unavailable() {
    // Bind then drop to get a port with nothing listening.
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let result = tokio::task::spawn_blocking(move || {
        let client = ChatCompletionsClient::new(&config)?;
        client.complete(&[ChatMessage::user("hello")])
    })
    .await
    .expect("join");

    assert!(matches!(
        result,
        Err(AssistantError::GenerationUnavailable(_))
    ));
}
