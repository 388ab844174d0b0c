#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(clippy::pedantic, clippy::unwrap_used)]

//! Typed client for the Dify app (chat) and knowledge base (dataset) HTTP APIs.
//!
//! ```rust,no_run
//! # use dify_ox::{Dify, DatasetDocumentsRequest};
//! # #[tokio::main]
//! # async fn main() -> Result<(), dify_ox::DifyRequestError> {
//! let client = Dify::new("https://api.dify.ai", "app-key", "dataset-key");
//! let request = DatasetDocumentsRequest::builder().dataset_id("ds1").limit(20).build();
//! let documents = client.api().list_documents(&request).await?;
//! println!("{} documents", documents.total);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod datasets;
pub mod error;
mod request_builder;
pub mod scope;

pub use api::Api;
pub use chat::{
    ChatMessageRequest, ChatMessageResponse, CompletionMessageRequest, CompletionMessageResponse,
    Conversation, ConversationsRequest, ConversationsResponse,
};
pub use config::ClientConfig;
pub use datasets::{
    documents::{
        CreatedDocument, DataSourceInfo, DatasetDocument, DatasetDocumentsRequest,
        DatasetDocumentsResponse, DocumentCreateByFileRequest, DocumentCreateByFileResponse,
        DocumentCreateData, DocumentDeleteRequest, DocumentDeleteResponse, IndexingStatus,
        IndexingStatusRequest, IndexingStatusResponse, IndexingTechnique, ProcessMode,
        ProcessRule,
    },
    segments::{Segment, SegmentsRequest, SegmentsResponse},
};
pub use error::{ApiError, ApiErrorBody, DifyRequestError};
pub use scope::ApiScope;

use core::fmt;

use crate::request_builder::RequestBuilder;

/// Dify API client.
///
/// Holds the normalized host, both API keys and one HTTP client. Cloning is
/// cheap and clones share the connection pool.
#[derive(Clone)]
pub struct Dify {
    pub(crate) host: String,
    pub(crate) chat_api_secret: String,
    pub(crate) dataset_api_secret: String,
    pub(crate) request_builder: RequestBuilder,
}

impl Dify {
    /// Create a client with the default HTTP transport.
    pub fn new(
        host: impl Into<String>,
        chat_api_secret: impl Into<String>,
        dataset_api_secret: impl Into<String>,
    ) -> Self {
        Self::with_http_client(
            host.into(),
            chat_api_secret.into(),
            dataset_api_secret.into(),
            reqwest::Client::new(),
        )
    }

    /// Create a client from a full [`ClientConfig`].
    ///
    /// Fails only when a new HTTP client has to be built and the TLS backend
    /// cannot be initialized. The host is not validated here.
    pub fn from_config(config: ClientConfig) -> Result<Self, DifyRequestError> {
        let client = match config.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(Self::with_http_client(
            config.host,
            config.chat_api_secret,
            config.dataset_api_secret,
            client,
        ))
    }

    pub fn load_from_env() -> Result<Self, DifyRequestError> {
        Self::from_config(ClientConfig::from_env()?)
    }

    fn with_http_client(
        host: String,
        chat_api_secret: String,
        dataset_api_secret: String,
        client: reqwest::Client,
    ) -> Self {
        let host = host.trim_end_matches('/').to_string();
        Self {
            request_builder: RequestBuilder::new(client, host.clone()),
            host,
            chat_api_secret,
            dataset_api_secret,
        }
    }

    /// A handle for issuing API calls with this client's keys.
    pub fn api(&self) -> Api {
        Api::new(self.clone())
    }

    /// Host with any trailing slash removed.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Debug for Dify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dify")
            .field("host", &self.host)
            .field("chat_api_secret", &"[REDACTED]")
            .field("dataset_api_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
