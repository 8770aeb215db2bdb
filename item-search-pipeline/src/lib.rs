//! # Item Search Pipeline
//!
//! This crate loads items into the search index.
//!
//! ## Components
//!
//! 1. **Loader**: chunks a document sequence into bulk writes
//! 2. **Generator**: produces sample items with staggered creation times

pub mod errors;
pub mod generator;
pub mod loader;

pub use errors::PipelineError;
pub use generator::{demo_items, generate_items};
pub use loader::{BulkIndexer, BulkSummary, DEFAULT_BATCH_SIZE};
