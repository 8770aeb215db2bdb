//! Pipeline error types.

use item_search_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while loading documents.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Batches must hold at least one document.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// A bulk write failed. Earlier batches of the same call stay committed.
    #[error(
        "Bulk write failed after {batches_flushed} batches ({documents_flushed} documents) were committed"
    )]
    PartialBatchFailure {
        batches_flushed: usize,
        documents_flushed: usize,
        #[source]
        source: SearchError,
    },

    #[error(transparent)]
    Search(#[from] SearchError),
}
