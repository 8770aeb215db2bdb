//! Builds query descriptors from search criteria.

use tracing::debug;

use super::{BoolClause, Clause, QueryDescriptor, RangeClause, RangeValue};
use crate::config::IndexConfig;
use crate::errors::SearchError;
use item_search_shared::{
    fields, Bounds, FieldMapping, FieldType, IndexSchema, ItemDocument, MatchMode, SearchCriteria,
};

/// Turns [`SearchCriteria`] into a [`QueryDescriptor`] for one index.
///
/// Building is pure: every call returns a new descriptor and nothing is
/// shared between calls.
///
/// Composition rules:
/// - free text against several fields goes into `should` with
///   `minimum_should_match = 1`, or into a dis-max in `must` for
///   [`MatchMode::BestFields`], or one `must` match per field for
///   [`MatchMode::AllFields`]
/// - category is an exact `must` term
/// - every supplied range bound becomes its own `must` range clause
/// - no clauses at all yields match-all
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    index: String,
    schema: IndexSchema,
}

impl QueryBuilder {
    /// Create a builder for the item index described by `config`.
    pub fn new(config: &IndexConfig) -> Self {
        Self::with_schema(config, ItemDocument::schema())
    }

    pub fn with_schema(config: &IndexConfig, schema: IndexSchema) -> Self {
        Self {
            index: config.name.clone(),
            schema,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Build a descriptor. Never executes anything.
    pub fn build(&self, criteria: &SearchCriteria) -> Result<QueryDescriptor, SearchError> {
        if criteria.page.size == 0 {
            return Err(SearchError::invalid_query("page size must be greater than 0"));
        }

        let mut must = Vec::new();
        let mut should = Vec::new();

        if let Some(text) = criteria.effective_text() {
            if criteria.fields.is_empty() {
                return Err(SearchError::invalid_query(
                    "free text requires at least one field",
                ));
            }

            let matches = criteria
                .fields
                .iter()
                .map(|weighted| -> Result<Clause, SearchError> {
                    self.queryable(&weighted.field)?;
                    if let Some(boost) = weighted.boost {
                        if !boost.is_finite() || boost <= 0.0 {
                            return Err(SearchError::invalid_query(format!(
                                "boost for `{}` must be a positive number",
                                weighted.field
                            )));
                        }
                    }
                    Ok(Clause::Match {
                        field: weighted.field.clone(),
                        text: text.to_string(),
                        boost: weighted.boost,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            match criteria.match_mode {
                MatchMode::AnyField => should.extend(matches),
                MatchMode::BestFields => must.push(Clause::DisMax { queries: matches }),
                MatchMode::AllFields => must.extend(matches),
            }
        }

        if let Some(category) = criteria
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            self.queryable(fields::CATEGORY)?;
            must.push(Clause::Term {
                field: fields::CATEGORY.to_string(),
                value: category.to_string(),
            });
        }

        for bound in [criteria.price.lower, criteria.price.upper].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(SearchError::invalid_query("price bounds must be finite"));
            }
        }

        self.push_ranges(&mut must, fields::PRICE, &criteria.price, RangeValue::Double)?;
        self.push_ranges(
            &mut must,
            fields::CREATE_TIME,
            &criteria.create_time,
            RangeValue::Long,
        )?;

        let query = if must.is_empty() && should.is_empty() {
            Clause::MatchAll
        } else {
            let minimum_should_match = (!should.is_empty()).then_some(1);
            Clause::Bool(BoolClause {
                must,
                should,
                minimum_should_match,
            })
        };

        let mut sort = Vec::new();
        if let Some(spec) = &criteria.sort {
            let mapping = self.queryable(&spec.field)?;
            if mapping.field_type == FieldType::Text {
                return Err(SearchError::invalid_query(format!(
                    "cannot sort on analyzed field `{}`",
                    spec.field
                )));
            }
            sort.push(spec.clone());
        }

        for highlight in &criteria.highlight {
            self.queryable(&highlight.field)?;
        }

        let descriptor = QueryDescriptor {
            index: self.index.clone(),
            query,
            sort,
            highlight: criteria.highlight.clone(),
            page: criteria.page,
        };

        debug!(index = %self.index, query = ?descriptor.query, "Built query");
        Ok(descriptor)
    }

    fn push_ranges<T: Copy>(
        &self,
        must: &mut Vec<Clause>,
        field: &str,
        bounds: &Bounds<T>,
        value: impl Fn(T) -> RangeValue,
    ) -> Result<(), SearchError> {
        if bounds.is_unbounded() {
            return Ok(());
        }
        self.queryable(field)?;

        if let Some(lower) = bounds.lower {
            must.push(Clause::Range(RangeClause::gte(field, value(lower))));
        }
        if let Some(upper) = bounds.upper {
            must.push(Clause::Range(RangeClause::lte(field, value(upper))));
        }
        Ok(())
    }

    /// Look up a field that queries may reference.
    fn queryable(&self, field: &str) -> Result<&FieldMapping, SearchError> {
        let mapping = self
            .schema
            .field(field)
            .ok_or_else(|| SearchError::invalid_query(format!("unknown field `{}`", field)))?;

        if !mapping.indexed {
            return Err(SearchError::invalid_query(format!(
                "field `{}` is not indexed",
                field
            )));
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use item_search_shared::{HighlightField, PageRequest, SortOrder, WeightedField};

    fn builder() -> QueryBuilder {
        QueryBuilder::new(&IndexConfig::default())
    }

    #[test]
    fn test_empty_criteria_is_match_all() {
        let descriptor = builder().build(&SearchCriteria::all()).unwrap();

        assert_eq!(descriptor.query, Clause::MatchAll);
        assert_eq!(descriptor.index, "item");
        assert!(descriptor.sort.is_empty());
        assert_eq!(descriptor.page, PageRequest::of(0, 10));
    }

    #[test]
    fn test_weighted_should_sets_minimum_should_match() {
        let descriptor = builder().build(&SearchCriteria::text("design")).unwrap();

        let clause = descriptor.bool_clause().unwrap();
        assert!(clause.must.is_empty());
        assert_eq!(clause.should.len(), 2);
        assert_eq!(clause.minimum_should_match, Some(1));
        assert_eq!(
            clause.should[0],
            Clause::Match {
                field: "title".to_string(),
                text: "design".to_string(),
                boost: Some(3.0),
            }
        );
    }

    #[test]
    fn test_lower_time_bound_only() {
        let criteria = SearchCriteria::all().created_between(Some(1_588_332_480_000), None);

        let descriptor = builder().build(&criteria).unwrap();

        let ranges = descriptor.must_ranges();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].field, "createTime");
        assert_eq!(ranges[0].lower, Some(RangeValue::Long(1_588_332_480_000)));
        assert!(ranges[0].upper.is_none());
        assert!(ranges[0].include_lower);
        assert_eq!(descriptor.bool_clause().unwrap().minimum_should_match, None);
    }

    #[test]
    fn test_both_bounds_are_separate_must_clauses() {
        let criteria = SearchCriteria::all().with_price_between(Some(50.0), Some(70.0));

        let descriptor = builder().build(&criteria).unwrap();

        let ranges = descriptor.must_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].lower, Some(RangeValue::Double(50.0)));
        assert_eq!(ranges[1].upper, Some(RangeValue::Double(70.0)));
    }

    #[test]
    fn test_best_fields_uses_dis_max() {
        let criteria = SearchCriteria::text("Fowler")
            .in_fields(SearchCriteria::best_field_defaults())
            .with_match_mode(MatchMode::BestFields);

        let descriptor = builder().build(&criteria).unwrap();

        let clause = descriptor.bool_clause().unwrap();
        assert!(clause.should.is_empty());
        assert_eq!(clause.minimum_should_match, None);
        match &clause.must[0] {
            Clause::DisMax { queries } => {
                assert_eq!(queries.len(), 2);
                assert!(matches!(
                    &queries[1],
                    Clause::Match { field, boost: Some(b), .. } if field == "brand" && *b == 0.8
                ));
            }
            other => panic!("expected dis_max, got {:?}", other),
        }
    }

    #[test]
    fn test_all_fields_match_in_must() {
        let criteria = SearchCriteria::text("usa")
            .in_fields(vec![WeightedField::new("title")])
            .with_match_mode(MatchMode::AllFields)
            .with_category("customs");

        let descriptor = builder().build(&criteria).unwrap();

        let clause = descriptor.bool_clause().unwrap();
        assert_eq!(clause.must.len(), 2);
        assert!(matches!(&clause.must[1], Clause::Term { value, .. } if value == "customs"));
    }

    #[test]
    fn test_should_with_must_keeps_minimum_should_match() {
        let criteria = SearchCriteria::text("design").with_price_between(None, Some(100.0));

        let clause = builder().build(&criteria).unwrap().bool_clause().cloned().unwrap();

        assert_eq!(clause.must.len(), 1);
        assert_eq!(clause.should.len(), 2);
        assert_eq!(clause.minimum_should_match, Some(1));
    }

    #[test]
    fn test_blank_text_and_category_are_ignored() {
        let criteria = SearchCriteria::text("  ").with_category(" ");

        assert_eq!(builder().build(&criteria).unwrap().query, Clause::MatchAll);
    }

    #[test]
    fn test_sort_and_highlight_carried() {
        let criteria = SearchCriteria::text("design")
            .sorted_by("createTime", SortOrder::Desc)
            .highlighting(HighlightField::new("title"));

        let descriptor = builder().build(&criteria).unwrap();

        assert_eq!(descriptor.sort.len(), 1);
        assert_eq!(descriptor.sort[0].order, SortOrder::Desc);
        assert_eq!(descriptor.highlight[0].field, "title");
    }

    #[test]
    fn test_builds_are_independent() {
        let builder = builder();
        let first = builder
            .build(&SearchCriteria::text("a").with_category("x"))
            .unwrap();
        let second = builder.build(&SearchCriteria::all()).unwrap();

        assert!(first.bool_clause().is_some());
        assert_eq!(second.query, Clause::MatchAll);
    }

    #[test]
    fn test_rejects_invalid_criteria() {
        let builder = builder();
        let cases = vec![
            SearchCriteria::all().with_page(PageRequest::of(0, 0)),
            SearchCriteria::text("x").in_fields(vec![]),
            SearchCriteria::text("x").in_fields(vec![WeightedField::new("missing")]),
            SearchCriteria::text("x").in_fields(vec![WeightedField::new("images")]),
            SearchCriteria::text("x").in_fields(vec![WeightedField::boosted("title", -1.0)]),
            SearchCriteria::all().sorted_by("title", SortOrder::Asc),
            SearchCriteria::all().sorted_by("images", SortOrder::Asc),
            SearchCriteria::all().highlighting(HighlightField::new("images")),
            SearchCriteria::all().with_price_between(Some(f64::NAN), None),
        ];

        for criteria in cases {
            let result = builder.build(&criteria);
            assert!(
                matches!(result, Err(SearchError::InvalidQuery(_))),
                "expected invalid query for {:?}",
                criteria
            );
        }
    }
}
