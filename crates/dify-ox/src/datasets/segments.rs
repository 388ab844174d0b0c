use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{API_VERSION, DATASETS, DOCUMENTS, unix_to_utc};
use crate::{
    Api,
    error::DifyRequestError,
    request_builder::{Endpoint, HttpMethod},
    scope::ApiScope,
};

/// Segments of one document, optionally filtered by keyword and status.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct SegmentsRequest {
    #[builder(into)]
    pub dataset_id: String,
    #[builder(into)]
    pub document_id: String,
    #[builder(into)]
    pub keyword: Option<String>,
    /// Indexing status filter, e.g. `completed`.
    #[builder(into)]
    pub status: Option<String>,
}

impl SegmentsRequest {
    fn query_params(&self) -> Vec<(String, String)> {
        [("keyword", &self.keyword), ("status", &self.status)]
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }
}

/// A chunk of an indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub position: i64,
    pub document_id: String,
    pub content: String,
    #[serde(default)]
    pub answer: Option<String>,
    pub word_count: i64,
    pub tokens: i64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub index_node_id: Option<String>,
    #[serde(default)]
    pub index_node_hash: Option<String>,
    pub hit_count: i64,
    pub enabled: bool,
    #[serde(default)]
    pub disabled_at: Value,
    #[serde(default)]
    pub disabled_by: Value,
    pub status: String,
    pub created_by: String,
    pub created_at: i64,
    #[serde(default)]
    pub indexing_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub stopped_at: Option<i64>,
}

impl Segment {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.created_at)
    }

    pub fn completed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.completed_at.and_then(unix_to_utc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentsResponse {
    pub data: Vec<Segment>,
    #[serde(default)]
    pub doc_form: Option<String>,
}

impl Api {
    /// List the segments of a document.
    #[instrument(
        skip(self, request),
        fields(dataset_id = %request.dataset_id, document_id = %request.document_id)
    )]
    pub async fn list_segments(
        &self,
        request: &SegmentsRequest,
    ) -> Result<SegmentsResponse, DifyRequestError> {
        let endpoint = Endpoint::new(
            HttpMethod::Get,
            ApiScope::Dataset,
            [
                API_VERSION,
                DATASETS,
                request.dataset_id.as_str(),
                DOCUMENTS,
                request.document_id.as_str(),
                "segments",
            ],
        )
        .with_query_params(request.query_params());

        self.request(&endpoint).await
    }
}
