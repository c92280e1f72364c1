use std::path::PathBuf;

use thiserror::Error;

use kupah_azure::AzureError;

/// Errors produced while building or querying the knowledge base.
#[derive(Debug, Error)]
pub enum KbError {
    /// Filesystem failure while scanning sources or touching the cache.
    #[error("knowledge-base I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cache file exists but cannot be decoded.
    #[error("cache file {path} is unreadable: {message}")]
    Cache { path: PathBuf, message: String },

    /// The embeddings provider failed after retries; the build is aborted
    /// and no partial cache is written.
    #[error(transparent)]
    Embedding(#[from] AzureError),
}
