//! Search error types.
//!
//! This module defines the error types that can occur while talking to the
//! search backend or building queries for it.

use thiserror::Error;

/// Errors that can occur during search backend operations.
///
/// Backend failures are never retried at this layer; they reach the caller
/// as returned by the backend.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Search query execution failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to index a single document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// A bulk write was rejected or had item failures.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse response from the backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The query criteria are invalid.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The target index does not exist.
    #[error("Index not found: {0}")]
    NotFound(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create an index not found error.
    pub fn not_found(index: impl Into<String>) -> Self {
        Self::NotFound(index.into())
    }

    /// Whether the backend was unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}
