//! Request and response types exchanged with the search backend.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::SearchError;
use item_search_shared::ItemDocument;

/// A document ready to be written: backend id plus serialized source.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: String,
    pub source: Value,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>, source: Value) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

impl TryFrom<&ItemDocument> for IndexEntry {
    type Error = SearchError;

    fn try_from(document: &ItemDocument) -> Result<Self, Self::Error> {
        let source = serde_json::to_value(document)
            .map_err(|e| SearchError::serialization(format!("item {}: {}", document.id, e)))?;

        Ok(Self::new(document.document_id(), source))
    }
}

/// A single hit as returned by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawHit {
    pub id: String,
    /// Relevance score. Absent when results are sorted on a field.
    pub score: Option<f64>,
    pub source: Value,
    /// Highlighted fragments keyed by field name.
    pub highlight: HashMap<String, Vec<String>>,
}

/// One page of raw results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BackendPageResult {
    pub total_elements: u64,
    pub hits: Vec<RawHit>,
}

impl BackendPageResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
