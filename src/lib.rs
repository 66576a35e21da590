#![deny(missing_docs)]

//! Core library for the notebridge document-intelligence client.

/// Sequential batch helpers built on top of the client.
pub mod batch;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Client activity counters.
pub mod metrics;
/// Document-intelligence service integration.
pub mod notebook;
