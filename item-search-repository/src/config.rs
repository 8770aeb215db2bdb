//! Configuration types for the item index.

/// Default index name.
pub const DEFAULT_INDEX_NAME: &str = "item";

/// Default document type name.
pub const DEFAULT_DOC_TYPE: &str = "docs";

/// Identity and settings of the index items are written to and read from.
///
/// Passed explicitly to every component that touches the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index name.
    pub name: String,
    /// Document type name carried on bulk writes.
    pub doc_type: String,
    /// Number of primary shards used when the index is created.
    pub shards: u32,
    /// Number of replicas used when the index is created.
    pub replicas: u32,
    /// Analyzer for text fields (e.g. `ik_max_word`). Backend default if unset.
    pub text_analyzer: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            shards: 5,
            replicas: 1,
            text_analyzer: None,
        }
    }
}

impl IndexConfig {
    /// Create a config for the named index with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    pub fn with_shards(mut self, shards: u32, replicas: u32) -> Self {
        self.shards = shards;
        self.replicas = replicas;
        self
    }

    pub fn with_text_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.text_analyzer = Some(analyzer.into());
        self
    }
}
