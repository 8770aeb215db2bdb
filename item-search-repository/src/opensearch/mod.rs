//! OpenSearch implementation of the search backend.
//!
//! This module provides a concrete implementation of `SearchBackend`
//! using OpenSearch.

mod client;
mod index_config;
mod queries;

pub use client::OpenSearchBackend;
pub use index_config::get_index_settings;
pub use queries::build_search_body;
