//! Shared types used by the document service client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the document service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The bearer credential was rejected. The service message is surfaced
    /// verbatim so callers can match on its invalid-key indicator.
    #[error("{message}")]
    Auth {
        /// Rejection message exactly as reported by the service.
        message: String,
    },
    /// The service does not know the requested resource.
    #[error("{message}")]
    NotFound {
        /// Detail message associated with the missing resource.
        message: String,
    },
    /// The service rejected the request as malformed.
    #[error("{message}")]
    Validation {
        /// Detail message describing the request defect.
        message: String,
    },
    /// Any other non-success response, including bodies that flag a failure
    /// on an otherwise successful status.
    #[error("Unexpected service response ({status}): {message}")]
    Service {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Detail message when present, raw response body otherwise.
        message: String,
    },
}

impl ApiError {
    /// True when the failure is the service telling us there is nothing
    /// uploaded to search yet. Callers issuing queries treat this as an
    /// empty result rather than an error worth surfacing.
    pub fn is_empty_corpus(&self) -> bool {
        matches!(
            self,
            Self::NotFound { message } if message.to_ascii_lowercase().contains("no documents")
        )
    }

    /// True when the failure identifies a rejected credential.
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Map a failing HTTP status and its detail message into the error taxonomy.
pub(crate) fn classify_failure(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { message },
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation { message }
        }
        _ => ApiError::Service { status, message },
    }
}

/// Upload endpoint revisions exposed by the service.
///
/// Both revisions share the external contract and yield the same
/// [`Document`] shape; v2 is the preferred path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadProtocol {
    /// Original upload path.
    V1,
    /// Enhanced upload path.
    #[default]
    V2,
}

impl UploadProtocol {
    pub(crate) fn process_path(self) -> &'static str {
        match self {
            Self::V1 => "api/process",
            Self::V2 => "api/v2/process",
        }
    }
}

impl std::str::FromStr for UploadProtocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            _ => Err(()),
        }
    }
}

/// Closed set of source formats accepted by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// PDF document.
    Pdf,
    /// Plain text.
    #[serde(alias = "txt")]
    Text,
    /// Markdown text.
    #[serde(alias = "md")]
    Markdown,
    /// Word-processor document.
    Docx,
}

impl SourceKind {
    /// Derive the source kind from an upload filename, if its extension is supported.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.')?.1.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Content type attached to the `file` part of an upload.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Lifecycle stage reported for an uploaded document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Stored by the service but not yet picked up by the pipeline.
    Uploaded,
    /// Analysis currently in flight.
    Processing,
    /// Analysis finished; derived fields are available.
    #[serde(alias = "processed")]
    Completed,
    /// The pipeline gave up on this document.
    Failed,
}

impl DocumentStatus {
    /// True once the pipeline has produced derived fields for the document.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Derived analysis fields produced by the processing pipeline.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalysis {
    /// Prose summary of the document.
    pub summary: Option<String>,
    /// Key takeaways formatted as bullet-point text.
    pub bullet_points: Option<String>,
    /// Topics identified across the document.
    pub topics: Vec<String>,
    /// Confidence label attached by the pipeline, when reported.
    pub confidence: Option<String>,
}

/// Document record as reported by the service.
///
/// The service owns the record; every field here is fetched fresh per call
/// and nothing is cached locally.
#[derive(Debug, Clone)]
pub struct Document {
    /// Opaque identifier assigned by the service.
    pub id: String,
    /// Caller-supplied title.
    pub title: String,
    /// Source format, when the service reports one.
    pub source: Option<SourceKind>,
    /// Current lifecycle stage.
    pub status: DocumentStatus,
    /// Derived fields. `None` until `status` is completed; absent, not
    /// merely empty, for uploaded or processing documents.
    pub analysis: Option<DocumentAnalysis>,
}

/// Answer produced by a natural-language query.
#[derive(Debug, Clone, Default)]
pub struct QueryAnswer {
    /// Answer text produced by the service.
    pub answer: String,
    /// Source citations backing the answer.
    pub sources: Vec<String>,
    /// Number of documents the service consulted.
    pub documents_consulted: usize,
}

/// One entry from the caller's query history. Read-only from the client's
/// perspective.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    /// Identifier assigned by the service.
    pub id: String,
    /// Original question.
    pub question: String,
    /// Answer the service produced at the time.
    pub answer: String,
    /// Source citations recorded with the answer.
    pub sources: Vec<String>,
    /// Document ids the question was scoped to.
    pub document_ids: Vec<String>,
    /// Creation timestamp as reported by the service (RFC3339).
    pub created_at: String,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) detail: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Upload response shape shared by both protocol revisions. v1 reports
/// `success`/`document_id`/`summary`/`bullet_points`; v2 adds `title`,
/// `status`, and `key_points`. Lenient defaults absorb both.
#[derive(Deserialize)]
pub(crate) struct ProcessResponse {
    #[serde(default = "default_true")]
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) document_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(rename = "type", default)]
    pub(crate) source: Option<SourceKind>,
    #[serde(default)]
    pub(crate) status: Option<DocumentStatus>,
    #[serde(default)]
    pub(crate) summary: Option<String>,
    #[serde(default)]
    pub(crate) bullet_points: Option<String>,
    #[serde(default, alias = "key_points")]
    pub(crate) topics: Vec<String>,
    #[serde(default)]
    pub(crate) confidence: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct DocumentRecord {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(rename = "type", default)]
    pub(crate) source: Option<SourceKind>,
    #[serde(default)]
    pub(crate) status: Option<DocumentStatus>,
    #[serde(default)]
    pub(crate) summary: Option<String>,
    #[serde(default)]
    pub(crate) bullet_points: Option<String>,
    #[serde(default, alias = "key_points")]
    pub(crate) topics: Vec<String>,
    #[serde(default)]
    pub(crate) confidence: Option<String>,
}

impl DocumentRecord {
    /// Stored records without an explicit status are fully processed; the
    /// service only persists finished documents on the original path.
    pub(crate) fn into_document(self) -> Document {
        let status = self.status.unwrap_or(DocumentStatus::Completed);
        let analysis = gate_analysis(
            status,
            self.summary,
            self.bullet_points,
            self.topics,
            self.confidence,
        );
        Document {
            id: self.id,
            title: self.title,
            source: self.source,
            status,
            analysis,
        }
    }
}

/// Derived fields are only meaningful once the pipeline reports completion.
pub(crate) fn gate_analysis(
    status: DocumentStatus,
    summary: Option<String>,
    bullet_points: Option<String>,
    topics: Vec<String>,
    confidence: Option<String>,
) -> Option<DocumentAnalysis> {
    if !status.is_completed() {
        return None;
    }
    Some(DocumentAnalysis {
        summary,
        bullet_points,
        topics,
        confidence,
    })
}

#[derive(Deserialize)]
pub(crate) struct DeleteResponse {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default = "default_true")]
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) answer: Option<String>,
    #[serde(default)]
    pub(crate) sources: Vec<String>,
    #[serde(default)]
    pub(crate) document_count: Option<usize>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ChatEntryRecord {
    pub(crate) id: String,
    pub(crate) question: String,
    pub(crate) answer: String,
    #[serde(default)]
    pub(crate) sources: Vec<String>,
    #[serde(default)]
    pub(crate) document_ids: Vec<String>,
    #[serde(default)]
    pub(crate) created_at: String,
}

impl From<ChatEntryRecord> for ChatEntry {
    fn from(record: ChatEntryRecord) -> Self {
        Self {
            id: record.id,
            question: record.question,
            answer: record.answer,
            sources: record.sources,
            document_ids: record.document_ids,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_statuses_into_taxonomy() {
        let auth = classify_failure(StatusCode::UNAUTHORIZED, "Invalid API key".into());
        assert!(auth.is_invalid_key());
        assert_eq!(auth.to_string(), "Invalid API key");

        let missing = classify_failure(StatusCode::NOT_FOUND, "Document not found".into());
        assert!(matches!(missing, ApiError::NotFound { .. }));

        let invalid = classify_failure(StatusCode::BAD_REQUEST, "Unsupported file type".into());
        assert!(matches!(invalid, ApiError::Validation { .. }));

        let oversized = classify_failure(StatusCode::PAYLOAD_TOO_LARGE, "File too large".into());
        assert!(matches!(oversized, ApiError::Validation { .. }));

        let flaky = classify_failure(StatusCode::BAD_GATEWAY, "upstream offline".into());
        match flaky {
            ApiError::Service { status, message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream offline");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn empty_corpus_predicate_matches_service_wording() {
        let benign = classify_failure(
            StatusCode::NOT_FOUND,
            "No documents found to query".into(),
        );
        assert!(benign.is_empty_corpus());

        let unknown_id = classify_failure(StatusCode::NOT_FOUND, "Document not found".into());
        assert!(!unknown_id.is_empty_corpus());
    }

    #[test]
    fn status_accepts_legacy_processed_value() {
        let status: DocumentStatus = serde_json::from_str("\"processed\"").expect("status");
        assert_eq!(status, DocumentStatus::Completed);
        let status: DocumentStatus = serde_json::from_str("\"processing\"").expect("status");
        assert_eq!(status, DocumentStatus::Processing);
    }

    #[test]
    fn source_kind_sniffs_supported_extensions() {
        assert_eq!(SourceKind::from_filename("report.PDF"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_filename("notes.md"), Some(SourceKind::Markdown));
        assert_eq!(SourceKind::from_filename("letter.docx"), Some(SourceKind::Docx));
        assert_eq!(SourceKind::from_filename("raw.txt"), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_filename("archive.zip"), None);
        assert_eq!(SourceKind::from_filename("no-extension"), None);
    }

    #[test]
    fn upload_protocol_parses_both_revisions() {
        assert_eq!("v1".parse::<UploadProtocol>(), Ok(UploadProtocol::V1));
        assert_eq!("V2".parse::<UploadProtocol>(), Ok(UploadProtocol::V2));
        assert!("v3".parse::<UploadProtocol>().is_err());
        assert_eq!(UploadProtocol::default(), UploadProtocol::V2);
    }

    #[test]
    fn analysis_absent_until_processing_completes() {
        let record: DocumentRecord = serde_json::from_value(serde_json::json!({
            "id": "doc-7",
            "title": "In flight",
            "status": "processing",
            "summary": "half-done text that must not leak"
        }))
        .expect("record");
        let document = record.into_document();
        assert_eq!(document.status, DocumentStatus::Processing);
        assert!(document.analysis.is_none());
    }

    #[test]
    fn stored_record_without_status_is_completed() {
        let record: DocumentRecord = serde_json::from_value(serde_json::json!({
            "id": "doc-8",
            "title": "Archived",
            "summary": "Summary text",
            "bullet_points": "• one\n• two"
        }))
        .expect("record");
        let document = record.into_document();
        assert_eq!(document.status, DocumentStatus::Completed);
        let analysis = document.analysis.expect("analysis present");
        assert_eq!(analysis.summary.as_deref(), Some("Summary text"));
    }

    #[test]
    fn process_response_absorbs_both_wire_shapes() {
        let v1: ProcessResponse = serde_json::from_value(serde_json::json!({
            "success": true,
            "document_id": "doc-1",
            "summary": "Short summary",
            "bullet_points": "• point"
        }))
        .expect("v1 shape");
        assert!(v1.success);
        assert_eq!(v1.document_id.as_deref(), Some("doc-1"));
        assert!(v1.status.is_none());

        let v2: ProcessResponse = serde_json::from_value(serde_json::json!({
            "document_id": "doc-2",
            "title": "Quarterly report",
            "status": "completed",
            "key_points": ["revenue", "churn"]
        }))
        .expect("v2 shape");
        assert!(v2.success);
        assert_eq!(v2.topics, vec!["revenue".to_string(), "churn".to_string()]);
        assert_eq!(v2.status, Some(DocumentStatus::Completed));
    }
}
