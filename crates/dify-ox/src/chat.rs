//! App endpoints, signed with the chat API key. Only blocking responses are supported.

use std::collections::HashMap;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::{
    Api,
    datasets::unix_to_utc,
    error::DifyRequestError,
    request_builder::{Endpoint, HttpMethod},
    scope::ApiScope,
};

const BLOCKING: &str = "blocking";

fn blocking() -> String {
    BLOCKING.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ChatMessageRequest {
    #[builder(into)]
    pub query: String,
    /// Values for the app's input variables.
    #[builder(default)]
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    /// End-user identifier, unique within the app.
    #[builder(into)]
    pub user: String,
    /// Continue an existing conversation; a new one is started when absent.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[builder(skip = blocking())]
    #[serde(default = "blocking")]
    pub response_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub event: Option<String>,
    pub message_id: String,
    pub conversation_id: String,
    pub mode: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: i64,
}

impl ChatMessageResponse {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct CompletionMessageRequest {
    #[builder(default)]
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    #[builder(into)]
    pub user: String,
    #[builder(skip = blocking())]
    #[serde(default = "blocking")]
    pub response_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessageResponse {
    #[serde(default)]
    pub event: Option<String>,
    pub message_id: String,
    pub mode: String,
    pub answer: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: i64,
}

/// Conversations of one end user, newest first. Page with `last_id`.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ConversationsRequest {
    #[builder(into)]
    pub user: String,
    #[builder(into)]
    pub last_id: Option<String>,
    pub limit: Option<u32>,
}

impl ConversationsRequest {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("user".to_string(), self.user.clone())];
        if let Some(last_id) = self.last_id.as_deref().filter(|id| !id.is_empty()) {
            params.push(("last_id".to_string(), last_id.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub inputs: HashMap<String, Value>,
    pub status: String,
    #[serde(default)]
    pub introduction: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub limit: i64,
    pub has_more: bool,
    pub data: Vec<Conversation>,
}

impl Api {
    /// Send a chat message and wait for the full answer.
    #[instrument(
        skip(self, request),
        fields(user = %request.user, conversation_id = ?request.conversation_id)
    )]
    pub async fn chat_messages(
        &self,
        request: &ChatMessageRequest,
    ) -> Result<ChatMessageResponse, DifyRequestError> {
        let endpoint = Endpoint::new(HttpMethod::Post, ApiScope::Chat, ["v1", "chat-messages"]);
        self.request_json(&endpoint, Some(request)).await
    }

    /// Run a completion app and wait for the full answer.
    #[instrument(skip(self, request), fields(user = %request.user))]
    pub async fn completion_messages(
        &self,
        request: &CompletionMessageRequest,
    ) -> Result<CompletionMessageResponse, DifyRequestError> {
        let endpoint = Endpoint::new(
            HttpMethod::Post,
            ApiScope::Chat,
            ["v1", "completion-messages"],
        );
        self.request_json(&endpoint, Some(request)).await
    }

    #[instrument(skip(self, request), fields(user = %request.user))]
    pub async fn conversations(
        &self,
        request: &ConversationsRequest,
    ) -> Result<ConversationsResponse, DifyRequestError> {
        let endpoint = Endpoint::new(HttpMethod::Get, ApiScope::Chat, ["v1", "conversations"])
            .with_query_params(request.query_params());
        self.request(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_is_always_blocking() {
        let request = ChatMessageRequest::builder()
            .query("hello")
            .user("user-1")
            .build();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "query": "hello",
                "inputs": {},
                "user": "user-1",
                "response_mode": "blocking"
            })
        );
    }

    #[test]
    fn test_chat_request_with_conversation() {
        let request = ChatMessageRequest::builder()
            .query("and then?")
            .user("user-1")
            .conversation_id("conv-1")
            .inputs(HashMap::from([("lang".to_string(), json!("en"))]))
            .build();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["conversation_id"], "conv-1");
        assert_eq!(value["inputs"]["lang"], "en");
    }

    #[test]
    fn test_conversations_query() {
        let request = ConversationsRequest::builder().user("user-1").build();
        assert_eq!(
            request.query_params(),
            vec![("user".to_string(), "user-1".to_string())]
        );

        let request = ConversationsRequest::builder()
            .user("user-1")
            .last_id("conv-9")
            .limit(20)
            .build();
        assert_eq!(request.query_params().len(), 3);
    }
}
