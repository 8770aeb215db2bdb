//! OpenSearch query rendering.
//!
//! This module translates a [`QueryDescriptor`] into an OpenSearch search
//! request body.

use serde_json::{json, Map, Value};

use crate::query::{BoolClause, Clause, QueryDescriptor, RangeClause, RangeValue};

/// Build the full search request body for a descriptor.
///
/// The body carries the query, the page window (`from`/`size`), field sorts
/// and highlight settings. Total hits are always tracked exactly so page
/// counts are correct past 10,000 matches.
pub fn build_search_body(descriptor: &QueryDescriptor) -> Value {
    let mut body = Map::new();

    body.insert("query".to_string(), render_clause(&descriptor.query));
    body.insert("from".to_string(), json!(descriptor.page.offset()));
    body.insert("size".to_string(), json!(descriptor.page.size));
    body.insert("track_total_hits".to_string(), json!(true));

    if !descriptor.sort.is_empty() {
        let sort: Vec<Value> = descriptor
            .sort
            .iter()
            .map(|spec| json!({ spec.field.as_str(): { "order": spec.order.as_str() } }))
            .collect();
        body.insert("sort".to_string(), Value::Array(sort));
    }

    if !descriptor.highlight.is_empty() {
        let mut fields = Map::new();
        for field in &descriptor.highlight {
            fields.insert(
                field.field.clone(),
                json!({
                    "pre_tags": [field.pre_tag],
                    "post_tags": [field.post_tag]
                }),
            );
        }
        body.insert("highlight".to_string(), json!({ "fields": fields }));
    }

    Value::Object(body)
}

fn render_clause(clause: &Clause) -> Value {
    match clause {
        Clause::MatchAll => json!({ "match_all": {} }),
        Clause::Match { field, text, boost } => {
            let mut inner = Map::new();
            inner.insert("query".to_string(), json!(text));
            if let Some(boost) = boost {
                inner.insert("boost".to_string(), json!(boost));
            }
            json!({ "match": { field.as_str(): inner } })
        }
        Clause::Term { field, value } => json!({ "term": { field.as_str(): value } }),
        Clause::Range(range) => render_range(range),
        Clause::DisMax { queries } => {
            let queries: Vec<Value> = queries.iter().map(render_clause).collect();
            json!({ "dis_max": { "queries": queries } })
        }
        Clause::Bool(clause) => render_bool(clause),
    }
}

fn render_bool(clause: &BoolClause) -> Value {
    let mut inner = Map::new();

    if !clause.must.is_empty() {
        let must: Vec<Value> = clause.must.iter().map(render_clause).collect();
        inner.insert("must".to_string(), Value::Array(must));
    }
    if !clause.should.is_empty() {
        let should: Vec<Value> = clause.should.iter().map(render_clause).collect();
        inner.insert("should".to_string(), Value::Array(should));
    }
    if let Some(minimum) = clause.minimum_should_match {
        inner.insert("minimum_should_match".to_string(), json!(minimum));
    }

    json!({ "bool": inner })
}

fn render_range(range: &RangeClause) -> Value {
    let mut bounds = Map::new();

    if let Some(lower) = range.lower {
        let key = if range.include_lower { "gte" } else { "gt" };
        bounds.insert(key.to_string(), range_value(lower));
    }
    if let Some(upper) = range.upper {
        let key = if range.include_upper { "lte" } else { "lt" };
        bounds.insert(key.to_string(), range_value(upper));
    }

    json!({ "range": { range.field.as_str(): bounds } })
}

fn range_value(value: RangeValue) -> Value {
    match value {
        RangeValue::Long(v) => json!(v),
        RangeValue::Double(v) => json!(v),
    }
}
