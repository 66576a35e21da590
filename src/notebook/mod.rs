//! Document-intelligence service integration.

pub mod client;
pub mod types;

pub use client::NotebookService;
pub use types::{
    ApiError, ChatEntry, Document, DocumentAnalysis, DocumentStatus, QueryAnswer, SourceKind,
    UploadProtocol,
};
