//! Batch orchestration over the document service client.
//!
//! Callers that handle several items in one go (a folder of email
//! attachments, a list of questions, a sweep of uploaded ids) issue calls
//! sequentially. A failure on one item is caught and reported for that item
//! only; siblings always run.

use crate::metrics::{ClientMetrics, MetricsSnapshot};
use crate::notebook::{ApiError, ChatEntry, Document, NotebookService, QueryAnswer};
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;

/// Abstraction over the remote document API used by batch helpers.
#[async_trait]
pub trait NotebookApi: Send + Sync {
    /// Upload a document for processing.
    async fn process_document(
        &self,
        content: Vec<u8>,
        filename: &str,
        title: &str,
    ) -> Result<Document, ApiError>;

    /// Enumerate the caller's documents.
    async fn list_documents(&self) -> Result<Vec<Document>, ApiError>;

    /// Fetch a single document by id.
    async fn get_document(&self, id: &str) -> Result<Document, ApiError>;

    /// Delete a document, returning the confirmation message.
    async fn delete_document(&self, id: &str) -> Result<String, ApiError>;

    /// Ask a natural-language question, optionally scoped to document ids.
    async fn query(&self, question: &str, document_ids: &[String])
    -> Result<QueryAnswer, ApiError>;

    /// Fetch the caller's query history.
    async fn chat_history(&self) -> Result<Vec<ChatEntry>, ApiError>;
}

#[async_trait]
impl NotebookApi for NotebookService {
    async fn process_document(
        &self,
        content: Vec<u8>,
        filename: &str,
        title: &str,
    ) -> Result<Document, ApiError> {
        NotebookService::process_document(self, content, filename, title).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        NotebookService::list_documents(self).await
    }

    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        NotebookService::get_document(self, id).await
    }

    async fn delete_document(&self, id: &str) -> Result<String, ApiError> {
        NotebookService::delete_document(self, id).await
    }

    async fn query(
        &self,
        question: &str,
        document_ids: &[String],
    ) -> Result<QueryAnswer, ApiError> {
        NotebookService::query(self, question, document_ids).await
    }

    async fn chat_history(&self) -> Result<Vec<ChatEntry>, ApiError> {
        NotebookService::chat_history(self).await
    }
}

/// One document queued for upload.
#[derive(Debug, Clone)]
pub struct AttachmentInput {
    /// Filename carried into the multipart `file` part.
    pub filename: String,
    /// Title stored with the document.
    pub title: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

/// Outcome of one item within a batch run.
#[derive(Debug)]
pub struct ItemReport<T> {
    /// Label identifying the item (filename or question).
    pub label: String,
    /// Result for this item alone.
    pub outcome: Result<T, ApiError>,
}

impl<T> ItemReport<T> {
    /// True when this item completed without error.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-item results of a batch run, stamped with its start time.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// RFC3339 timestamp taken when the run began.
    pub started_at: String,
    /// One report per input item, in input order.
    pub items: Vec<ItemReport<T>>,
}

impl<T> BatchReport<T> {
    /// Number of items that completed without error.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.succeeded()).count()
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Tally of a cleanup sweep over uploaded document ids.
#[derive(Debug, Clone)]
pub struct CleanupSummary {
    /// RFC3339 timestamp taken when the sweep began.
    pub started_at: String,
    /// Ids confirmed deleted by the service.
    pub deleted: usize,
    /// Ids the service no longer knew; expected noise, not a failure.
    pub missing: usize,
    /// Ids whose deletion failed for any other reason.
    pub failed: usize,
}

/// Runs sequential multi-item operations against the document service,
/// isolating per-item failures and recording activity counters.
pub struct BatchRunner<S> {
    api: S,
    metrics: Arc<ClientMetrics>,
}

impl<S: NotebookApi> BatchRunner<S> {
    /// Wrap an API handle in a batch runner with fresh counters.
    pub fn new(api: S) -> Self {
        Self {
            api,
            metrics: Arc::new(ClientMetrics::new()),
        }
    }

    /// Upload every attachment in order, reporting success or failure per item.
    pub async fn upload_all(&self, items: Vec<AttachmentInput>) -> BatchReport<Document> {
        let started_at = current_timestamp_rfc3339();
        let mut reports = Vec::with_capacity(items.len());

        for item in items {
            let outcome = self
                .api
                .process_document(item.content, &item.filename, &item.title)
                .await;
            match &outcome {
                Ok(document) => {
                    self.metrics.record_upload();
                    tracing::info!(
                        filename = %item.filename,
                        document_id = %document.id,
                        "Attachment processed"
                    );
                }
                Err(error) => {
                    self.metrics.record_failure();
                    tracing::warn!(filename = %item.filename, error = %error, "Attachment failed");
                }
            }
            reports.push(ItemReport {
                label: item.filename,
                outcome,
            });
        }

        BatchReport {
            started_at,
            items: reports,
        }
    }

    /// Ask every question in order against the given scope.
    ///
    /// The service rejecting a question because nothing is uploaded yet is a
    /// benign case: it becomes an empty [`QueryAnswer`], not an error.
    pub async fn ask_all(
        &self,
        questions: &[String],
        scope: &[String],
    ) -> BatchReport<QueryAnswer> {
        let started_at = current_timestamp_rfc3339();
        let mut reports = Vec::with_capacity(questions.len());

        for question in questions {
            let outcome = match self.api.query(question, scope).await {
                Ok(answer) => {
                    self.metrics.record_answer();
                    Ok(answer)
                }
                Err(error) if error.is_empty_corpus() => {
                    tracing::debug!(question = %question, "Nothing uploaded yet; empty answer");
                    self.metrics.record_answer();
                    Ok(QueryAnswer::default())
                }
                Err(error) => {
                    self.metrics.record_failure();
                    tracing::warn!(question = %question, error = %error, "Question failed");
                    Err(error)
                }
            };
            reports.push(ItemReport {
                label: question.clone(),
                outcome,
            });
        }

        BatchReport {
            started_at,
            items: reports,
        }
    }

    /// Delete every id in order, tolerating already-missing documents.
    pub async fn cleanup(&self, ids: &[String]) -> CleanupSummary {
        let started_at = current_timestamp_rfc3339();
        let mut summary = CleanupSummary {
            started_at,
            deleted: 0,
            missing: 0,
            failed: 0,
        };

        for id in ids {
            match self.api.delete_document(id).await {
                Ok(_) => summary.deleted += 1,
                Err(error) if matches!(error, ApiError::NotFound { .. }) => {
                    // Already gone; the sweep only cares that it is absent.
                    tracing::debug!(document_id = %id, "Document already absent");
                    summary.missing += 1;
                }
                Err(error) => {
                    self.metrics.record_failure();
                    tracing::warn!(document_id = %id, error = %error, "Cleanup delete failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            deleted = summary.deleted,
            missing = summary.missing,
            failed = summary.failed,
            "Cleanup sweep finished"
        );
        summary
    }

    /// Return the current activity counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Current timestamp formatted for batch reports.
fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
