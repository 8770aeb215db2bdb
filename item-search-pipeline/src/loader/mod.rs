//! Loader module for the item search pipeline.
//!
//! Loads documents into the search index in fixed-size bulk writes.

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::errors::PipelineError;
use item_search_repository::{IndexConfig, IndexEntry, SearchBackend};
use item_search_shared::ItemDocument;

/// Batch size used when the caller has no preference.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Outcome of a successful [`BulkIndexer::submit_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkSummary {
    /// Documents written.
    pub documents: usize,
    /// Bulk write calls made.
    pub batches: usize,
    /// Whether the index had to be created first.
    pub index_created: bool,
}

/// Loader that writes documents to the index in batches.
///
/// The loader is responsible for:
/// - Making sure the target index exists before the first write
/// - Turning a document sequence into bulk writes of `batch_size` documents
/// - Reporting how far it got when a write fails
///
/// Writes are never retried and committed batches are never rolled back.
pub struct BulkIndexer {
    backend: Arc<dyn SearchBackend>,
    config: IndexConfig,
}

impl BulkIndexer {
    /// Create an indexer that writes to the index described by `config`.
    pub fn new(backend: Arc<dyn SearchBackend>, config: IndexConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Write every document, `batch_size` documents per bulk call.
    ///
    /// A full batch is flushed before the next document is appended and the
    /// remainder is flushed at the end, so `N` documents take `ceil(N / B)`
    /// calls. An empty sequence makes no backend calls at all.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkSummary)` - If every batch was written
    /// * `Err(PipelineError::InvalidBatchSize)` - If `batch_size` is zero
    /// * `Err(PipelineError::PartialBatchFailure)` - If a bulk write failed
    /// * `Err(PipelineError::Search)` - If the index check or creation failed
    #[instrument(skip(self, documents), fields(index = %self.config.name))]
    pub async fn submit_all<I>(
        &self,
        documents: I,
        batch_size: usize,
    ) -> Result<BulkSummary, PipelineError>
    where
        I: IntoIterator<Item = ItemDocument>,
    {
        if batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize(batch_size));
        }

        let mut summary = BulkSummary::default();
        let mut index_ready = false;
        let mut batch: Vec<IndexEntry> = Vec::with_capacity(batch_size);

        for document in documents {
            if batch.len() == batch_size {
                self.flush(&mut batch, &mut summary, &mut index_ready).await?;
            }
            batch.push(IndexEntry::try_from(&document)?);
        }

        if !batch.is_empty() {
            self.flush(&mut batch, &mut summary, &mut index_ready).await?;
        }

        info!(
            documents = summary.documents,
            batches = summary.batches,
            "Bulk indexing completed"
        );
        Ok(summary)
    }

    /// Flush the pending batch.
    async fn flush(
        &self,
        batch: &mut Vec<IndexEntry>,
        summary: &mut BulkSummary,
        index_ready: &mut bool,
    ) -> Result<(), PipelineError> {
        if !*index_ready {
            summary.index_created = self.prepare_index().await?;
            *index_ready = true;
        }

        let count = batch.len();
        match self
            .backend
            .bulk_write(batch, &self.config.name, &self.config.doc_type)
            .await
        {
            Ok(()) => {
                summary.batches += 1;
                summary.documents += count;
                batch.clear();
                debug!(
                    batch = summary.batches,
                    count = count,
                    total = summary.documents,
                    "Flushed batch"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    error = %e,
                    batch = summary.batches + 1,
                    count = count,
                    "Failed to write batch"
                );
                Err(PipelineError::PartialBatchFailure {
                    batches_flushed: summary.batches,
                    documents_flushed: summary.documents,
                    source: e,
                })
            }
        }
    }

    /// Create the index from the item schema if it is missing.
    async fn prepare_index(&self) -> Result<bool, PipelineError> {
        if self.backend.index_exists(&self.config.name).await? {
            return Ok(false);
        }

        self.backend
            .create_index(&self.config, &ItemDocument::schema())
            .await?;
        info!(index = %self.config.name, "Created missing index");
        Ok(true)
    }
}
