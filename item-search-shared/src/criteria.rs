//! Search criteria accepted by the query builder.

use serde::{Deserialize, Serialize};

use crate::document::fields;
use crate::page::PageRequest;

/// Markup wrapped around highlighted terms by default.
pub const DEFAULT_PRE_TAG: &str = "<span style=\"color:red\">";
pub const DEFAULT_POST_TAG: &str = "</span>";

/// How free text is matched against the weighted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// At least one field must match; scores are summed.
    #[default]
    AnyField,
    /// At least one field must match; the best single field score wins.
    BestFields,
    /// Every field must match.
    AllFields,
}

/// A field to match free text against, with an optional boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedField {
    pub field: String,
    pub boost: Option<f32>,
}

impl WeightedField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            boost: None,
        }
    }

    pub fn boosted(field: impl Into<String>, boost: f32) -> Self {
        Self {
            field: field.into(),
            boost: Some(boost),
        }
    }
}

/// Optional inclusive lower and upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub lower: Option<T>,
    pub upper: Option<T>,
}

impl<T> Bounds<T> {
    pub fn new(lower: Option<T>, upper: Option<T>) -> Self {
        Self { lower, upper }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort on a document field. Replaces relevance ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// A field to return highlighted snippets for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightField {
    pub field: String,
    pub pre_tag: String,
    pub post_tag: String,
}

impl HighlightField {
    pub fn new(field: impl Into<String>) -> Self {
        Self::with_tags(field, DEFAULT_PRE_TAG, DEFAULT_POST_TAG)
    }

    pub fn with_tags(
        field: impl Into<String>,
        pre_tag: impl Into<String>,
        post_tag: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            pre_tag: pre_tag.into(),
            post_tag: post_tag.into(),
        }
    }
}

/// Everything a caller can ask of an item search.
///
/// # Example
///
/// ```
/// use item_search_shared::{PageRequest, SearchCriteria, SortOrder};
///
/// let criteria = SearchCriteria::text("programming")
///     .with_price_between(Some(50.0), Some(70.0))
///     .sorted_by("createTime", SortOrder::Desc)
///     .with_page(PageRequest::of(0, 100));
/// assert_eq!(criteria.page.size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Free text. Blank text counts as absent.
    pub text: Option<String>,
    /// Fields the free text is matched against, primary field first.
    pub fields: Vec<WeightedField>,
    pub match_mode: MatchMode,
    /// Exact category filter.
    pub category: Option<String>,
    pub price: Bounds<f64>,
    /// `createTime` bounds in epoch milliseconds.
    pub create_time: Bounds<i64>,
    pub sort: Option<SortSpec>,
    pub highlight: Vec<HighlightField>,
    pub page: PageRequest,
}

impl SearchCriteria {
    /// Criteria matching every document.
    pub fn all() -> Self {
        Self {
            text: None,
            fields: Self::default_fields(),
            match_mode: MatchMode::default(),
            category: None,
            price: Bounds::default(),
            create_time: Bounds::default(),
            sort: None,
            highlight: Vec::new(),
            page: PageRequest::default(),
        }
    }

    /// Free text matched against the default weighted fields.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::all()
        }
    }

    /// `title` weighted above `category`.
    pub fn default_fields() -> Vec<WeightedField> {
        vec![
            WeightedField::boosted(fields::TITLE, 3.0),
            WeightedField::new(fields::CATEGORY),
        ]
    }

    /// `title` and a down-weighted `brand`, for best-field matching.
    pub fn best_field_defaults() -> Vec<WeightedField> {
        vec![
            WeightedField::new(fields::TITLE),
            WeightedField::boosted(fields::BRAND, 0.8),
        ]
    }

    pub fn in_fields(mut self, fields: Vec<WeightedField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price_between(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.price = Bounds::new(lower, upper);
        self
    }

    pub fn created_between(mut self, lower: Option<i64>, upper: Option<i64>) -> Self {
        self.create_time = Bounds::new(lower, upper);
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec::new(field, order));
        self
    }

    pub fn highlighting(mut self, field: HighlightField) -> Self {
        self.highlight.push(field);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// The free text, if it has any non-blank content.
    pub fn effective_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::all()
    }
}
