use std::time::Duration;

use bon::Builder;

const HOST_ENV: &str = "DIFY_HOST";
const CHAT_API_KEY_ENV: &str = "DIFY_CHAT_API_KEY";
const DATASET_API_KEY_ENV: &str = "DIFY_DATASET_API_KEY";
const TIMEOUT_ENV: &str = "DIFY_TIMEOUT_SECS";

/// Construction-time settings for a [`crate::Dify`] client.
///
/// `http_client` replaces the transport entirely. A built `reqwest::Client`
/// cannot be reconfigured, so `timeout` only applies when no client is supplied.
#[derive(Clone, Default, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub host: String,
    #[builder(into, default)]
    pub chat_api_secret: String,
    #[builder(into, default)]
    pub dataset_api_secret: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    /// Read `DIFY_HOST`, `DIFY_CHAT_API_KEY`, `DIFY_DATASET_API_KEY` and `DIFY_TIMEOUT_SECS`.
    ///
    /// Only the host is required. A timeout that is not a positive number of seconds is ignored.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let host = std::env::var(HOST_ENV)?;
        let timeout = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            host,
            chat_api_secret: std::env::var(CHAT_API_KEY_ENV).unwrap_or_default(),
            dataset_api_secret: std::env::var(DATASET_API_KEY_ENV).unwrap_or_default(),
            timeout,
            http_client: None,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("chat_api_secret", &"[REDACTED]")
            .field("dataset_api_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder().host("https://api.dify.ai").build();

        assert_eq!(config.host, "https://api.dify.ai");
        assert!(config.chat_api_secret.is_empty());
        assert!(config.dataset_api_secret.is_empty());
        assert!(config.timeout.is_none());
        assert!(config.http_client.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig::builder()
            .host("https://api.dify.ai")
            .chat_api_secret("app-secret")
            .dataset_api_secret("dataset-secret")
            .timeout(Duration::from_secs(5))
            .build();

        let debug = format!("{config:?}");
        assert!(!debug.contains("app-secret"));
        assert!(!debug.contains("dataset-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
