//! Error types for the item search repository.

mod search_error;

pub use search_error::SearchError;
