use reqwest::{
    Method, RequestBuilder as ReqwestRequestBuilder, Response, StatusCode, Url,
    header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    error::{self, DifyRequestError},
    scope::ApiScope,
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP method for API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// An API endpoint: method, path segments, query and the key it is signed with.
///
/// Path segments are pushed onto the host URL one by one, so ids containing
/// `/`, `?` or spaces are percent-encoded instead of changing the route. Empty,
/// `.` and `..` segments would be collapsed by URL normalization and are rejected.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub segments: Vec<String>,
    pub method: HttpMethod,
    pub scope: ApiScope,
    pub query_params: Option<Vec<(String, String)>>,
}

impl Endpoint {
    pub fn new<I, S>(method: HttpMethod, scope: ApiScope, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            method,
            scope,
            query_params: None,
        }
    }

    pub fn with_query_params(mut self, params: Vec<(String, String)>) -> Self {
        self.query_params = Some(params);
        self
    }

    /// Unencoded path, for logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Builds authenticated requests against the configured host and decodes the replies
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    host: String,
}

impl RequestBuilder {
    pub fn new(client: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    /// Resolve the full URL for an endpoint, query excluded
    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, DifyRequestError> {
        if let Some(segment) = endpoint
            .segments
            .iter()
            .find(|s| matches!(s.as_str(), "" | "." | ".."))
        {
            return Err(DifyRequestError::InvalidPathParameter(segment.clone()));
        }

        let mut url = Url::parse(&self.host)?;
        url.path_segments_mut()
            .map_err(|()| {
                DifyRequestError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .extend(&endpoint.segments);
        Ok(url)
    }

    /// Build a JSON request. The body, if any, is encoded before anything is sent.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        token: &str,
    ) -> Result<ReqwestRequestBuilder, DifyRequestError> {
        let mut req = self.build_request_with_options(endpoint, token, true)?;

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(DifyRequestError::Serialization)?;
            req = req.body(bytes);
        }

        Ok(req)
    }

    /// Build a request, optionally without the JSON content type (multipart sets its own)
    pub fn build_request_with_options(
        &self,
        endpoint: &Endpoint,
        token: &str,
        add_json_content_type: bool,
    ) -> Result<ReqwestRequestBuilder, DifyRequestError> {
        let url = self.url(endpoint)?;
        let method: Method = endpoint.method.into();

        let mut req = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CACHE_CONTROL, "no-cache");

        if let Some(ref params) = endpoint.query_params {
            req = req.query(params);
        }

        if add_json_content_type {
            req = req.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }

        Ok(req)
    }

    /// Execute a request with an optional JSON body and decode the JSON reply
    pub async fn request_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
        token: &str,
    ) -> Result<T, DifyRequestError> {
        let req = self.build_request(endpoint, body, token)?;
        self.send(endpoint, req).await
    }

    /// Execute a multipart form request (file uploads)
    pub async fn request_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        form: reqwest::multipart::Form,
        token: &str,
    ) -> Result<T, DifyRequestError> {
        let req = self
            .build_request_with_options(endpoint, token, false)?
            .multipart(form);
        self.send(endpoint, req).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        req: ReqwestRequestBuilder,
    ) -> Result<T, DifyRequestError> {
        debug!(
            method = ?endpoint.method,
            path = %endpoint.path(),
            scope = %endpoint.scope,
            "sending request"
        );
        let res = req.send().await?;
        Self::handle_response(res).await
    }

    /// Read the whole body, then decode it or turn it into an API error
    async fn handle_response<T: DeserializeOwned>(res: Response) -> Result<T, DifyRequestError> {
        let status = res.status();
        let bytes = res.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "received response");

        if status != StatusCode::OK {
            let err = error::parse_error_response(status, &bytes);
            warn!(
                status = status.as_u16(),
                code = ?err.api_error().map(|e| e.code.as_str()),
                "API returned an error"
            );
            return Err(err);
        }

        serde_json::from_slice::<T>(&bytes).map_err(|source| {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            debug!(error = %source, body = %body, "failed to decode response body");
            DifyRequestError::Decode { source, body }
        })
    }
}
