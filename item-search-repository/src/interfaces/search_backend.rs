//! Search backend trait definition.
//!
//! This module defines the abstract interface the item search components use
//! to reach a search engine (OpenSearch, in-memory, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::config::IndexConfig;
use crate::errors::SearchError;
use crate::query::QueryDescriptor;
use crate::types::{BackendPageResult, IndexEntry};
use item_search_shared::IndexSchema;

/// Abstract interface for search backend operations.
///
/// Every method is a single round trip to the backend. Implementations do
/// not retry; failures are returned to the caller as they happened.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Check whether the named index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create an index with the given settings and field mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(SearchError::IndexCreationError)` - If the backend rejected it
    async fn create_index(
        &self,
        config: &IndexConfig,
        schema: &IndexSchema,
    ) -> Result<(), SearchError>;

    /// Write a batch of documents in one bulk request.
    ///
    /// Existing documents with the same id are replaced.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every document in the batch was written
    /// * `Err(SearchError::BulkIndexError)` - If the request or any item failed
    async fn bulk_write(
        &self,
        batch: &[IndexEntry],
        index: &str,
        doc_type: &str,
    ) -> Result<(), SearchError>;

    /// Write a single document, replacing any document with the same id.
    async fn index_document(
        &self,
        entry: &IndexEntry,
        index: &str,
        doc_type: &str,
    ) -> Result<(), SearchError>;

    /// Execute a query and return the requested page of raw hits.
    async fn execute_query(&self, query: &QueryDescriptor)
        -> Result<BackendPageResult, SearchError>;

    /// Fetch the stored source of a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(source))` - If the document exists
    /// * `Ok(None)` - If it does not
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError>;

    /// Count the documents in an index.
    async fn count(&self, index: &str) -> Result<u64, SearchError>;

    /// Check if the backend is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
