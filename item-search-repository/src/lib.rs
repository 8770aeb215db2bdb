//! # Item Search Repository
//!
//! This crate provides the search backend interface and its implementations
//! for OpenSearch and for in-process use. It also holds the query builder that
//! turns search criteria into backend-neutral query descriptors, the
//! adapter that turns raw hits into item pages, and a client facade for
//! application code.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod pagination;
pub mod query;
pub mod types;

pub use client::ItemSearchClient;
pub use config::IndexConfig;
pub use errors::SearchError;
pub use interfaces::SearchBackend;
pub use memory::MemoryBackend;
pub use opensearch::OpenSearchBackend;
pub use pagination::paginate;
pub use query::{QueryBuilder, QueryDescriptor};
pub use types::{BackendPageResult, IndexEntry, RawHit};
