use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the Dify API: `{"code", "message", "status"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub status: u16,
}

/// Body of a non-200 response.
///
/// Older server versions answer with plain text, newer ones with an [`ApiError`].
/// Structured decoding is attempted first; the raw text is kept otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorBody {
    Structured(ApiError),
    Raw(String),
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorBody::Structured(err) => write!(f, "{}: {}", err.code, err.message),
            ApiErrorBody::Raw(body) => f.write_str(body),
        }
    }
}

/// Errors that can occur while talking to the Dify API
#[derive(Error, Debug)]
pub enum DifyRequestError {
    /// Connection, DNS, TLS or timeout failure, passed through from `reqwest`
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured host could not be turned into a request URL
    #[error("Invalid host URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A path parameter was empty, `.` or `..`; nothing was sent
    #[error("Invalid path parameter: {0:?}")]
    InvalidPathParameter(String),

    /// The request body could not be encoded; nothing was sent
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The server answered with a status other than 200 OK
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: ApiErrorBody },

    /// The upload form could not be assembled; nothing was sent
    #[error("Failed to build multipart form: {0}")]
    Multipart(#[source] reqwest::Error),

    /// A 200 OK body did not match the expected response shape
    #[error("Failed to decode response: {source}; body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Reading a local file for upload failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or not unicode
    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl DifyRequestError {
    /// True for failures that happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidUrl(_))
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Structured error body, when the server sent one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api {
                body: ApiErrorBody::Structured(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

/// Build an API error from a non-200 status and its full body
pub(crate) fn parse_error_response(
    status: reqwest::StatusCode,
    body: &bytes::Bytes,
) -> DifyRequestError {
    let body = match serde_json::from_slice::<ApiError>(body) {
        Ok(err) => ApiErrorBody::Structured(err),
        Err(_) => ApiErrorBody::Raw(String::from_utf8_lossy(body).into_owned()),
    };

    DifyRequestError::Api {
        status: status.as_u16(),
        body,
    }
}
