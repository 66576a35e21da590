//! HTTP client wrapper for the document-intelligence service.

use crate::config::get_config;
use crate::notebook::types::{
    ApiError, ChatEntry, ChatEntryRecord, DeleteResponse, Document, DocumentRecord,
    DocumentStatus, ErrorBody, ProcessResponse, QueryAnswer, QueryResponse, SourceKind,
    UploadProtocol, classify_failure, gate_analysis,
};
use reqwest::{Client, Method, StatusCode, multipart};
use serde_json::json;

/// Lightweight HTTP client for document service operations.
///
/// The client holds no state beyond its base URL, credential, and default
/// upload protocol, so instances can be used concurrently against the same
/// service with no coordination. Every operation issues exactly one outbound
/// request; there is no retry, caching, or client-imposed timeout.
pub struct NotebookService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) upload_protocol: UploadProtocol,
}

impl NotebookService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, ApiError> {
        let config = get_config();
        Self::with_endpoint(&config.api_url, &config.api_key, config.upload_protocol)
    }

    /// Construct a client against an explicit endpoint and credential.
    pub fn with_endpoint(
        base_url: &str,
        api_key: impl Into<String>,
        upload_protocol: UploadProtocol,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent("notebridge/0.2").build()?;
        let base_url = normalize_base_url(base_url).map_err(ApiError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            upload_protocol = ?upload_protocol,
            "Initialized document service client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            upload_protocol,
        })
    }

    /// Upload a document for processing using the configured protocol revision.
    pub async fn process_document(
        &self,
        content: Vec<u8>,
        filename: &str,
        title: &str,
    ) -> Result<Document, ApiError> {
        self.process_document_with(self.upload_protocol, content, filename, title)
            .await
    }

    /// Upload a document for processing via a specific protocol revision.
    ///
    /// The multipart body carries exactly two parts: a `title` text field and
    /// a `file` field with the filename, content type, and raw bytes. Both
    /// revisions return the same [`Document`] shape, so callers never branch
    /// on version.
    pub async fn process_document_with(
        &self,
        protocol: UploadProtocol,
        content: Vec<u8>,
        filename: &str,
        title: &str,
    ) -> Result<Document, ApiError> {
        let source = SourceKind::from_filename(filename).ok_or_else(|| ApiError::Validation {
            message: format!(
                "Unsupported file type: {filename}. Only PDF, TXT, MD, and DOCX files are supported."
            ),
        })?;

        let file_part = multipart::Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(source.mime_type())?;
        let form = multipart::Form::new()
            .text("title", title.to_string())
            .part("file", file_part);

        let response = self
            .request(Method::POST, protocol.process_path())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            tracing::error!(filename, error = %error, "Document upload failed");
            return Err(error);
        }

        let wire: ProcessResponse = response.json().await?;
        let document = document_from_upload(wire, status, title, Some(source))?;
        tracing::debug!(
            document_id = %document.id,
            status = ?document.status,
            protocol = ?protocol,
            "Document uploaded"
        );
        Ok(document)
    }

    /// Enumerate the caller's documents. An empty list is a valid result.
    pub async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        let response = self.request(Method::GET, "api/documents").send().await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            tracing::error!(error = %error, "Failed to list documents");
            return Err(error);
        }

        let records: Vec<DocumentRecord> = response.json().await?;
        Ok(records
            .into_iter()
            .map(DocumentRecord::into_document)
            .collect())
    }

    /// Fetch a single document by id.
    pub async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        let response = self
            .request(Method::GET, &format!("api/documents/{id}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            tracing::error!(document_id = id, error = %error, "Failed to fetch document");
            return Err(error);
        }

        let record: DocumentRecord = response.json().await?;
        Ok(record.into_document())
    }

    /// Delete a document, returning the service's confirmation message.
    ///
    /// Deletion is not idempotent on the service side: a second delete of the
    /// same id fails with [`ApiError::NotFound`]. Cleanup-style callers treat
    /// that as noise rather than a hard failure.
    pub async fn delete_document(&self, id: &str) -> Result<String, ApiError> {
        let response = self
            .request(Method::DELETE, &format!("api/documents/{id}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            tracing::error!(document_id = id, error = %error, "Failed to delete document");
            return Err(error);
        }

        let confirmation: DeleteResponse = response.json().await?;
        tracing::debug!(document_id = id, "Document deleted");
        Ok(confirmation
            .message
            .unwrap_or_else(|| "Document deleted".to_string()))
    }

    /// Ask a natural-language question against the caller's documents.
    ///
    /// When `document_ids` is empty the field is omitted and the service
    /// searches across all of the caller's documents. A service with nothing
    /// uploaded rejects the query with a condition recognizable through
    /// [`ApiError::is_empty_corpus`]; callers treat that as an empty result.
    pub async fn query(
        &self,
        question: &str,
        document_ids: &[String],
    ) -> Result<QueryAnswer, ApiError> {
        let mut body = json!({ "question": question });
        if !document_ids.is_empty() {
            body["document_ids"] = json!(document_ids);
        }

        let response = self
            .request(Method::POST, "api/query")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            if error.is_empty_corpus() {
                tracing::debug!("Query rejected: no documents uploaded yet");
            } else {
                tracing::error!(error = %error, "Query failed");
            }
            return Err(error);
        }

        let wire: QueryResponse = response.json().await?;
        if !wire.success {
            let message = wire
                .error
                .unwrap_or_else(|| "Query reported failure without detail".to_string());
            return Err(ApiError::Service { status, message });
        }

        Ok(QueryAnswer {
            answer: wire.answer.unwrap_or_default(),
            sources: wire.sources,
            documents_consulted: wire.document_count.unwrap_or_default(),
        })
    }

    /// Fetch the caller's query history.
    pub async fn chat_history(&self) -> Result<Vec<ChatEntry>, ApiError> {
        let response = self.request(Method::GET, "api/chat-history").send().await?;

        let status = response.status();
        if !status.is_success() {
            let error = decode_failure(status, response).await;
            tracing::error!(error = %error, "Failed to fetch chat history");
            return Err(error);
        }

        let records: Vec<ChatEntryRecord> = response.json().await?;
        Ok(records.into_iter().map(ChatEntry::from).collect())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client.request(method, url).bearer_auth(&self.api_key)
    }
}

/// Extract the failure message from a response and classify it.
///
/// Failure bodies are JSON objects carrying a `detail` string; when the body
/// is not JSON or lacks the field, the raw body is surfaced instead.
async fn decode_failure(status: StatusCode, response: reqwest::Response) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .unwrap_or(body);
    classify_failure(status, message)
}

fn document_from_upload(
    wire: ProcessResponse,
    status: StatusCode,
    request_title: &str,
    request_source: Option<SourceKind>,
) -> Result<Document, ApiError> {
    if !wire.success {
        let message = wire
            .error
            .unwrap_or_else(|| "Processing reported failure without detail".to_string());
        return Err(ApiError::Service { status, message });
    }

    let id = wire
        .document_id
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Service {
            status,
            message: "Upload response missing document id".to_string(),
        })?;

    // v1 answers synchronously and omits the status field entirely.
    let lifecycle = wire.status.unwrap_or(DocumentStatus::Completed);
    let analysis = gate_analysis(
        lifecycle,
        wire.summary,
        wire.bullet_points,
        wire.topics,
        wire.confidence,
    );

    Ok(Document {
        id,
        title: wire.title.unwrap_or_else(|| request_title.to_string()),
        source: wire.source.or(request_source),
        status: lifecycle,
        analysis,
    })
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::DELETE, Method::POST, MockServer};

    fn test_service(server: &MockServer) -> NotebookService {
        NotebookService::with_endpoint(&server.base_url(), "test-key", UploadProtocol::V2)
            .expect("client")
    }

    #[tokio::test]
    async fn upload_sends_title_and_file_parts() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v2/process")
                    .header("authorization", "Bearer test-key")
                    .body_contains("name=\"title\"")
                    .body_contains("Q4 Report")
                    .body_contains("name=\"file\"; filename=\"report.txt\"")
                    .body_contains("Revenue: $2.5M");
                then.status(200).json_body(serde_json::json!({
                    "document_id": "doc-42",
                    "title": "Q4 Report",
                    "status": "completed",
                    "summary": "Revenue summary",
                    "key_points": ["revenue"]
                }));
            })
            .await;

        let service = test_service(&server);
        let document = service
            .process_document(b"Revenue: $2.5M".to_vec(), "report.txt", "Q4 Report")
            .await
            .expect("upload");

        mock.assert();
        assert_eq!(document.id, "doc-42");
        assert_eq!(document.status, DocumentStatus::Completed);
        assert_eq!(document.source, Some(SourceKind::Text));
        let analysis = document.analysis.expect("analysis present");
        assert_eq!(analysis.summary.as_deref(), Some("Revenue summary"));
        assert_eq!(analysis.topics, vec!["revenue".to_string()]);
    }

    #[tokio::test]
    async fn legacy_upload_path_yields_same_document_shape() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/process");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "document_id": "doc-legacy",
                    "summary": "Short summary",
                    "bullet_points": "• one"
                }));
            })
            .await;

        let service = test_service(&server);
        let document = service
            .process_document_with(
                UploadProtocol::V1,
                b"body".to_vec(),
                "notes.md",
                "Meeting notes",
            )
            .await
            .expect("upload");

        mock.assert();
        assert_eq!(document.id, "doc-legacy");
        // Title and source fall back to the request when v1 omits them.
        assert_eq!(document.title, "Meeting notes");
        assert_eq!(document.source, Some(SourceKind::Markdown));
        assert_eq!(document.status, DocumentStatus::Completed);
        let analysis = document.analysis.expect("analysis present");
        assert_eq!(analysis.bullet_points.as_deref(), Some("• one"));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_before_any_request() {
        let server = MockServer::start_async().await;
        let service = test_service(&server);

        let error = service
            .process_document(b"bytes".to_vec(), "payload.zip", "Archive")
            .await
            .expect_err("rejected");

        assert!(matches!(error, ApiError::Validation { .. }));
        assert!(error.to_string().contains("payload.zip"));
    }

    #[tokio::test]
    async fn query_omits_scope_when_empty() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/query")
                    .json_body(serde_json::json!({ "question": "What changed?" }));
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "answer": "Nothing of note.",
                    "sources": ["doc-1"],
                    "document_count": 3
                }));
            })
            .await;

        let service = test_service(&server);
        let answer = service.query("What changed?", &[]).await.expect("query");

        mock.assert();
        assert_eq!(answer.answer, "Nothing of note.");
        assert_eq!(answer.sources, vec!["doc-1".to_string()]);
        assert_eq!(answer.documents_consulted, 3);
    }

    #[tokio::test]
    async fn query_sends_scope_when_present() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/query").json_body(serde_json::json!({
                    "question": "What was the revenue?",
                    "document_ids": ["doc-42"]
                }));
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "answer": "$2.5M",
                    "document_count": 1
                }));
            })
            .await;

        let service = test_service(&server);
        let answer = service
            .query("What was the revenue?", &["doc-42".to_string()])
            .await
            .expect("query");

        mock.assert();
        assert_eq!(answer.answer, "$2.5M");
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn query_failure_body_surfaces_error_message() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/query");
                then.status(200).json_body(serde_json::json!({
                    "success": false,
                    "error": "model unavailable"
                }));
            })
            .await;

        let service = test_service(&server);
        let error = service.query("anything", &[]).await.expect_err("failure");

        match error {
            ApiError::Service { message, .. } => assert_eq!(message, "model unavailable"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_falls_back_to_raw_body_without_detail() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/documents/doc-9");
                then.status(500).body("backend exploded");
            })
            .await;

        let service = test_service(&server);
        let error = service.delete_document("doc-9").await.expect_err("failure");

        match error {
            ApiError::Service { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn base_url_normalization_trims_trailing_slashes() {
        let normalized = normalize_base_url("http://example.org/").expect("url");
        assert_eq!(
            format_endpoint(&normalized, "/api/documents"),
            "http://example.org/api/documents"
        );
        assert!(normalize_base_url("not a url").is_err());
    }
}
