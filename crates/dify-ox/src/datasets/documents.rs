use std::path::Path;

use bon::Builder;
use chrono::{DateTime, Utc};
use bytes::Bytes;
use reqwest::{
    Body,
    multipart::{Form, Part},
};
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

/// Query for the documents of one dataset.
///
/// `keyword` is always sent, even when empty. `page` and `limit` are only sent
/// when they are greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct DatasetDocumentsRequest {
    #[builder(into)]
    pub dataset_id: String,
    #[builder(into, default)]
    pub keyword: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl DatasetDocumentsRequest {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("keyword".to_string(), self.keyword.clone())];
        if let Some(page) = self.page.filter(|p| *p > 0) {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// A document as listed in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub id: String,
    pub position: i64,
    pub data_source_type: String,
    #[serde(default)]
    pub data_source_info: Value,
    #[serde(default)]
    pub dataset_process_rule_id: Value,
    pub name: String,
    pub created_from: String,
    pub created_by: String,
    pub created_at: i64,
    pub tokens: i64,
    pub indexing_status: String,
    #[serde(default)]
    pub error: Value,
    pub enabled: bool,
    #[serde(default)]
    pub disabled_at: Value,
    #[serde(default)]
    pub disabled_by: Value,
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_form: Option<String>,
}

impl DatasetDocument {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocumentsResponse {
    pub limit: i64,
    pub has_more: bool,
    pub total: i64,
    pub page: i64,
    pub data: Vec<DatasetDocument>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexingTechnique {
    #[default]
    HighQuality,
    Economy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessMode {
    #[default]
    Automatic,
    Custom,
}

/// How the server cleans and splits the uploaded file. `rules` is passed through as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct ProcessRule {
    #[builder(default)]
    pub mode: ProcessMode,
    #[builder(default)]
    #[serde(default)]
    pub rules: Value,
}

/// Metadata sent as the `data` part of a file upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct DocumentCreateData {
    /// Id of an existing document this upload replaces.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_document_id: Option<String>,
    #[builder(default)]
    pub indexing_technique: IndexingTechnique,
    #[builder(default)]
    pub process_rule: ProcessRule,
}

/// Upload a file as a new document.
#[derive(Debug, Clone, Builder)]
pub struct DocumentCreateByFileRequest {
    #[builder(into)]
    pub dataset_id: String,
    /// Raw file content. Cloning the request or sending it shares the buffer.
    #[builder(into)]
    pub file: Bytes,
    #[builder(into)]
    pub file_name: String,
    #[builder(default)]
    pub data: DocumentCreateData,
}

impl DocumentCreateByFileRequest {
    /// Read `path` into memory, naming the upload after the file.
    pub async fn from_path(
        dataset_id: impl Into<String>,
        path: impl AsRef<Path>,
        data: DocumentCreateData,
    ) -> Result<Self, DifyRequestError> {
        let path = path.as_ref();
        let file = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self {
            dataset_id: dataset_id.into(),
            file: file.into(),
            file_name,
            data,
        })
    }

    fn form(&self) -> Result<Form, DifyRequestError> {
        let data = serde_json::to_string(&self.data).map_err(DifyRequestError::Serialization)?;
        let mime = mime_guess::from_path(&self.file_name).first_or_octet_stream();
        let file = file_part(self.file.clone(), self.file_name.clone(), mime.as_ref())?;

        Ok(Form::new().part("file", file).text("data", data))
    }
}

fn file_part(file: Bytes, file_name: String, mime: &str) -> Result<Part, DifyRequestError> {
    let len = file.len() as u64;
    Part::stream_with_length(Body::from(file), len)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(DifyRequestError::Multipart)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub upload_file_id: String,
}

/// The document record returned right after an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub id: String,
    pub position: i64,
    pub data_source_type: String,
    pub data_source_info: DataSourceInfo,
    #[serde(default)]
    pub dataset_process_rule_id: Option<String>,
    pub name: String,
    pub created_from: String,
    pub created_by: String,
    pub created_at: i64,
    pub tokens: i64,
    pub indexing_status: String,
    #[serde(default)]
    pub error: Value,
    pub enabled: bool,
    #[serde(default)]
    pub disabled_at: Value,
    #[serde(default)]
    pub disabled_by: Value,
    pub archived: bool,
    pub display_status: String,
    pub word_count: i64,
    pub hit_count: i64,
    pub doc_form: String,
}

impl CreatedDocument {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.created_at)
    }
}

/// `batch` identifies the upload for [`Api::indexing_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCreateByFileResponse {
    pub document: CreatedDocument,
    pub batch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct IndexingStatusRequest {
    #[builder(into)]
    pub dataset_id: String,
    #[builder(into)]
    pub batch: String,
}

/// Indexing progress of one document in an upload batch. Timing fields stay
/// `None` until the stage is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub id: String,
    pub indexing_status: String,
    pub processing_started_at: Option<f64>,
    pub parsing_completed_at: Option<f64>,
    pub cleaning_completed_at: Option<f64>,
    pub splitting_completed_at: Option<f64>,
    pub completed_at: Option<f64>,
    pub paused_at: Option<f64>,
    #[serde(default)]
    pub error: Value,
    pub stopped_at: Option<f64>,
    pub completed_segments: i64,
    pub total_segments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatusResponse {
    pub data: Vec<IndexingStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct DocumentDeleteRequest {
    #[builder(into)]
    pub dataset_id: String,
    #[builder(into)]
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDeleteResponse {
    pub result: String,
}

impl Api {
    /// List the documents of a dataset.
    #[instrument(skip(self, request), fields(dataset_id = %request.dataset_id))]
    pub async fn list_documents(
        &self,
        request: &DatasetDocumentsRequest,
    ) -> Result<DatasetDocumentsResponse, DifyRequestError> {
        let endpoint = Endpoint::new(
            HttpMethod::Get,
            ApiScope::Dataset,
            [API_VERSION, DATASETS, request.dataset_id.as_str(), DOCUMENTS],
        )
        .with_query_params(request.query_params());

        self.request(&endpoint).await
    }

    /// Upload a file as a new document.
    ///
    /// Keep the returned `batch` to poll [`Api::indexing_status`].
    #[instrument(
        skip(self, request),
        fields(
            dataset_id = %request.dataset_id,
            file_name = %request.file_name,
            size = request.file.len()
        )
    )]
    pub async fn create_document_by_file(
        &self,
        request: &DocumentCreateByFileRequest,
    ) -> Result<DocumentCreateByFileResponse, DifyRequestError> {
        let form = request.form()?;
        let endpoint = Endpoint::new(
            HttpMethod::Post,
            ApiScope::Dataset,
            [API_VERSION, DATASETS, request.dataset_id.as_str(), "document", "create_by_file"],
        );

        self.request_multipart(&endpoint, form).await
    }

    /// Indexing progress for every document of an upload batch.
    #[instrument(
        skip(self, request),
        fields(dataset_id = %request.dataset_id, batch = %request.batch)
    )]
    pub async fn indexing_status(
        &self,
        request: &IndexingStatusRequest,
    ) -> Result<IndexingStatusResponse, DifyRequestError> {
        let endpoint = Endpoint::new(
            HttpMethod::Get,
            ApiScope::Dataset,
            [
                API_VERSION,
                DATASETS,
                request.dataset_id.as_str(),
                DOCUMENTS,
                request.batch.as_str(),
                "indexing-status",
            ],
        );

        self.request(&endpoint).await
    }

    #[instrument(
        skip(self, request),
        fields(dataset_id = %request.dataset_id, document_id = %request.document_id)
    )]
    pub async fn delete_document(
        &self,
        request: &DocumentDeleteRequest,
    ) -> Result<DocumentDeleteResponse, DifyRequestError> {
        let endpoint = Endpoint::new(
            HttpMethod::Delete,
            ApiScope::Dataset,
            [
                API_VERSION,
                DATASETS,
                request.dataset_id.as_str(),
                DOCUMENTS,
                request.document_id.as_str(),
            ],
        );

        self.request(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_omits_unset_paging() {
        let request = DatasetDocumentsRequest::builder().dataset_id("ds1").build();
        assert_eq!(
            request.query_params(),
            vec![("keyword".to_string(), String::new())]
        );
    }

    #[test]
    fn test_query_omits_zero_paging() {
        let request = DatasetDocumentsRequest::builder()
            .dataset_id("ds1")
            .keyword("handbook")
            .page(0)
            .limit(0)
            .build();
        assert_eq!(
            request.query_params(),
            vec![("keyword".to_string(), "handbook".to_string())]
        );
    }

    #[test]
    fn test_query_includes_positive_paging() {
        let request = DatasetDocumentsRequest::builder()
            .dataset_id("ds1")
            .page(2)
            .limit(50)
            .build();
        assert_eq!(
            request.query_params(),
            vec![
                ("keyword".to_string(), String::new()),
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_create_data_wire_format() {
        let data = DocumentCreateData::builder()
            .original_document_id("doc-old")
            .indexing_technique(IndexingTechnique::Economy)
            .process_rule(ProcessRule::builder().mode(ProcessMode::Custom).build())
            .build();

        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            serde_json::json!({
                "original_document_id": "doc-old",
                "indexing_technique": "economy",
                "process_rule": {"mode": "custom", "rules": null}
            })
        );
    }

    #[test]
    fn test_default_create_data() {
        let data = DocumentCreateData::default();
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            serde_json::json!({
                "indexing_technique": "high_quality",
                "process_rule": {"mode": "automatic", "rules": null}
            })
        );
        assert_eq!(IndexingTechnique::HighQuality.to_string(), "high_quality");
        assert_eq!(ProcessMode::Automatic.to_string(), "automatic");
    }

    #[test]
    fn test_document_tolerates_missing_optional_fields() {
        let doc: DatasetDocument = serde_json::from_value(serde_json::json!({
            "id": "doc1",
            "position": 1,
            "data_source_type": "upload_file",
            "data_source_info": null,
            "dataset_process_rule_id": null,
            "name": "handbook.pdf",
            "created_from": "api",
            "created_by": "user-1",
            "created_at": 1_681_623_639,
            "tokens": 0,
            "indexing_status": "waiting",
            "error": null,
            "enabled": true,
            "disabled_at": null,
            "disabled_by": null,
            "archived": false
        }))
        .unwrap();

        assert_eq!(doc.id, "doc1");
        assert!(doc.error.is_null());
        assert!(doc.display_status.is_none());
        assert!(doc.created_at_utc().is_some());
    }

    #[tokio::test]
    async fn test_from_path_reads_file_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello dify").await.unwrap();

        let request =
            DocumentCreateByFileRequest::from_path("ds1", &path, DocumentCreateData::default())
                .await
                .unwrap();

        assert_eq!(request.dataset_id, "ds1");
        assert_eq!(request.file_name, "notes.txt");
        assert_eq!(&request.file[..], b"hello dify");
    }

    #[test]
    fn test_form_is_built_without_copying_the_file() {
        let request = DocumentCreateByFileRequest::builder()
            .dataset_id("ds1")
            .file(b"%PDF-1.7".to_vec())
            .file_name("handbook.pdf")
            .build();

        let cloned = request.clone();
        assert_eq!(cloned.file.as_ptr(), request.file.as_ptr());
        assert!(request.form().is_ok());
    }

    #[test]
    fn test_bad_mime_is_a_multipart_error() {
        let err = file_part(Bytes::from_static(b"x"), "x.bin".to_string(), "not a mime")
            .unwrap_err();

        assert!(matches!(err, DifyRequestError::Multipart(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_io_error() {
        let err = DocumentCreateByFileRequest::from_path(
            "ds1",
            "/definitely/not/here.pdf",
            DocumentCreateData::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DifyRequestError::Io(_)));
    }
}
