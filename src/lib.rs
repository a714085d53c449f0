//! # swagger-index - Relational index over OpenAPI documents
//!
//! Fetches an OpenAPI/Swagger document, flattens it into four relational
//! tables and answers queries over the result.
//!
//! swagger-index provides:
//! - `$ref` name extraction and one-level property simplification
//! - A document normalizer producing versions, endpoints, parameters and schemas
//! - SQLite-backed storage with atomic per-version resync
//! - An ingestion orchestrator serializing resyncs per version
//! - MCP (stdio) and HTTP surfaces over the query operations

pub mod reference;
pub mod property;
pub mod model;
pub mod normalize;
pub mod storage;
pub mod fetch;
pub mod ingest;
pub mod render;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use reference::resolve_ref;
pub use property::{Property, PropertyDescriptor, simplify};
pub use model::{HttpMethod, ParamLocation};
pub use normalize::{NormalizedBatch, normalize};
pub use storage::SqliteStore;
pub use fetch::{DocumentFetcher, HttpFetcher};
pub use ingest::{Ingestor, SyncSummary};

/// Result type alias for swagger-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for swagger-index operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch document from '{url}': {message}")]
    Fetch { url: String, message: String },

    #[error("Invalid document: {0}")]
    Normalize(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a fetch error for `url`
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }
}
