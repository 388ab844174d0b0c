use core::fmt;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Dify,
    error::DifyRequestError,
    request_builder::Endpoint,
    scope::ApiScope,
};

/// A view over a [`Dify`] client that may carry its own API keys.
///
/// `with_chat_secret` and `with_dataset_secret` consume the handle and return a
/// new one, so a handle shared between call sites is never changed under them.
/// Keys are resolved on every request: a non-empty override wins, otherwise the
/// client's key is used.
#[derive(Clone)]
pub struct Api {
    client: Dify,
    chat_secret: Option<String>,
    dataset_secret: Option<String>,
}

impl Api {
    pub(crate) fn new(client: Dify) -> Self {
        Self {
            client,
            chat_secret: None,
            dataset_secret: None,
        }
    }

    /// Use `secret` for chat-scoped calls made through the returned handle.
    #[must_use]
    pub fn with_chat_secret(self, secret: impl Into<String>) -> Self {
        Self {
            chat_secret: Some(secret.into()),
            ..self
        }
    }

    /// Use `secret` for dataset-scoped calls made through the returned handle.
    #[must_use]
    pub fn with_dataset_secret(self, secret: impl Into<String>) -> Self {
        Self {
            dataset_secret: Some(secret.into()),
            ..self
        }
    }

    pub(crate) fn secret(&self, scope: ApiScope) -> &str {
        let (overridden, fallback) = match scope {
            ApiScope::Chat => (&self.chat_secret, &self.client.chat_api_secret),
            ApiScope::Dataset => (&self.dataset_secret, &self.client.dataset_api_secret),
        };

        overridden
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .unwrap_or(fallback.as_str())
    }

    pub(crate) async fn request_json<T, B>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<T, DifyRequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client
            .request_builder
            .request_json(endpoint, body, self.secret(endpoint.scope))
            .await
    }

    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
    ) -> Result<T, DifyRequestError> {
        self.request_json(endpoint, None::<&()>).await
    }

    pub(crate) async fn request_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        form: reqwest::multipart::Form,
    ) -> Result<T, DifyRequestError> {
        self.client
            .request_builder
            .request_multipart(endpoint, form, self.secret(endpoint.scope))
            .await
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("client", &self.client)
            .field("chat_secret", &self.chat_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "dataset_secret",
                &self.dataset_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
