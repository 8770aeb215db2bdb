//! # Item Search Shared
//!
//! Types shared by the item search crates: the indexable document, its index
//! schema, search criteria, pagination and the date helpers used to produce
//! `createTime` values.

pub mod criteria;
pub mod datetime;
pub mod document;
pub mod page;
pub mod schema;

pub use criteria::{Bounds, HighlightField, MatchMode, SearchCriteria, SortOrder, SortSpec, WeightedField};
pub use document::{fields, ItemDocument};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use schema::{FieldMapping, FieldType, IndexSchema};
