//! Backend-neutral query descriptors.
//!
//! A [`QueryDescriptor`] is the immutable output of the [`QueryBuilder`]. It is
//! plain data: backends translate it into their own query language when
//! executing it.

mod builder;

pub use builder::QueryBuilder;

use item_search_shared::{HighlightField, PageRequest, SortSpec};

/// A bound value in a range clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeValue {
    Long(i64),
    Double(f64),
}

impl RangeValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            RangeValue::Long(v) => *v as f64,
            RangeValue::Double(v) => *v,
        }
    }
}

/// A range constraint on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeClause {
    pub field: String,
    pub lower: Option<RangeValue>,
    pub upper: Option<RangeValue>,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl RangeClause {
    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: RangeValue) -> Self {
        Self {
            field: field.into(),
            lower: Some(value),
            upper: None,
            include_lower: true,
            include_upper: true,
        }
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: RangeValue) -> Self {
        Self {
            field: field.into(),
            lower: None,
            upper: Some(value),
            include_lower: true,
            include_upper: true,
        }
    }

    /// Whether `value` satisfies both bounds.
    pub fn contains(&self, value: f64) -> bool {
        let above = match self.lower {
            Some(lower) if self.include_lower => value >= lower.as_f64(),
            Some(lower) => value > lower.as_f64(),
            None => true,
        };
        let below = match self.upper {
            Some(upper) if self.include_upper => value <= upper.as_f64(),
            Some(upper) => value < upper.as_f64(),
            None => true,
        };
        above && below
    }
}

/// Boolean combination of clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolClause {
    pub must: Vec<Clause>,
    pub should: Vec<Clause>,
    pub minimum_should_match: Option<u32>,
}

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    MatchAll,
    /// Full-text match of `text` against `field`.
    Match {
        field: String,
        text: String,
        boost: Option<f32>,
    },
    /// Exact value match.
    Term { field: String, value: String },
    Range(RangeClause),
    /// Highest scoring sub-clause wins.
    DisMax { queries: Vec<Clause> },
    Bool(BoolClause),
}

/// A complete, executable search request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub index: String,
    pub query: Clause,
    /// Empty means relevance order.
    pub sort: Vec<SortSpec>,
    pub highlight: Vec<HighlightField>,
    pub page: PageRequest,
}

impl QueryDescriptor {
    /// The root boolean clause, if the query has one.
    pub fn bool_clause(&self) -> Option<&BoolClause> {
        match &self.query {
            Clause::Bool(clause) => Some(clause),
            _ => None,
        }
    }

    /// Range clauses in the root `must` list.
    pub fn must_ranges(&self) -> Vec<&RangeClause> {
        self.bool_clause()
            .map(|clause| {
                clause
                    .must
                    .iter()
                    .filter_map(|c| match c {
                        Clause::Range(range) => Some(range),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
