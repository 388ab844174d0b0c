use std::collections::HashMap;

use dify_ox::{ChatMessageRequest, CompletionMessageRequest, ConversationsRequest, Dify};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[tokio::test]
async fn test_chat_messages_blocking() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat-messages"))
        .and(header("authorization", "Bearer app-key"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_json(json!({
            "query": "What is Dify?",
            "inputs": {"lang": "en"},
            "user": "user-1",
            "conversation_id": "conv-1",
            "response_mode": "blocking"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "event": "message",
            "message_id": "msg-1",
            "conversation_id": "conv-1",
            "mode": "chat",
            "answer": "An LLM app platform.",
            "metadata": {"usage": {"total_tokens": 42}},
            "created_at": 1_705_407_629
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Dify::new(server.uri(), "app-key", "dataset-key");
    let request = ChatMessageRequest::builder()
        .query("What is Dify?")
        .inputs(HashMap::from([("lang".to_string(), json!("en"))]))
        .user("user-1")
        .conversation_id("conv-1")
        .build();
    let response = client.api().chat_messages(&request).await.unwrap();

    assert_eq!(response.message_id, "msg-1");
    assert_eq!(response.answer, "An LLM app platform.");
    assert_eq!(response.metadata["usage"]["total_tokens"], 42);
    assert!(response.created_at_utc().is_some());
}

#[tokio::test]
async fn test_completion_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completion-messages"))
        .and(header("authorization", "Bearer app-key"))
        .and(body_json(json!({
            "inputs": {"query": "Summarize"},
            "user": "user-1",
            "response_mode": "blocking"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message_id": "msg-2",
            "mode": "completion",
            "answer": "Summary.",
            "metadata": {},
            "created_at": 1_705_407_630
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Dify::new(server.uri(), "app-key", "dataset-key");
    let request = CompletionMessageRequest::builder()
        .inputs(HashMap::from([("query".to_string(), json!("Summarize"))]))
        .user("user-1")
        .build();
    let response = client.api().completion_messages(&request).await.unwrap();

    assert_eq!(response.mode, "completion");
    assert_eq!(response.answer, "Summary.");
    assert!(response.event.is_none());
}

#[tokio::test]
async fn test_conversations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/conversations"))
        .and(header("authorization", "Bearer app-key"))
        .and(query_param("user", "user-1"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "limit": 5,
            "has_more": false,
            "data": [{
                "id": "conv-1",
                "name": "About Dify",
                "inputs": {"lang": "en"},
                "status": "normal",
                "introduction": "",
                "created_at": 1_705_407_629
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Dify::new(server.uri(), "app-key", "dataset-key");
    let request = ConversationsRequest::builder().user("user-1").limit(5).build();
    let response = client.api().conversations(&request).await.unwrap();

    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].name, "About Dify");
    assert_eq!(response.data[0].inputs["lang"], "en");
}
