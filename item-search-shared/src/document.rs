//! The searchable item document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datetime;
use crate::schema::{FieldMapping, FieldType, IndexSchema};

/// Field names as stored in the search index.
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const IMAGES: &str = "images";
    pub const CREATE_TIME: &str = "createTime";
}

/// A document stored in the item index.
///
/// `id` doubles as the backend document id. `images` is stored but never
/// indexed, and `show_time` is never sent to the backend: it is derived from
/// `create_time` when a document is read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    /// Unique identifier, also used as the backend document id.
    pub id: i64,
    /// Analyzed full-text title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Exact-match category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Exact-match brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Display-only image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<String>,
    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    #[serde(skip)]
    pub show_time: Option<String>,
}

impl ItemDocument {
    /// Create a document with only its identifier set.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            title: None,
            category: None,
            brand: None,
            price: None,
            images: None,
            create_time: None,
            show_time: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_images(mut self, images: impl Into<String>) -> Self {
        self.images = Some(images.into());
        self
    }

    pub fn with_create_time(mut self, create_time: Option<i64>) -> Self {
        self.create_time = create_time;
        self
    }

    /// The id under which the document is stored in the backend.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }

    /// Fill `show_time` from `create_time`.
    pub fn with_show_time(mut self) -> Self {
        self.show_time = self.create_time.and_then(datetime::format_millis);
        self
    }

    /// The index schema derived from this model.
    pub fn schema() -> IndexSchema {
        IndexSchema::new(vec![
            FieldMapping::new(fields::ID, FieldType::Long),
            FieldMapping::new(fields::TITLE, FieldType::Text),
            FieldMapping::new(fields::CATEGORY, FieldType::Keyword),
            FieldMapping::new(fields::BRAND, FieldType::Keyword),
            FieldMapping::new(fields::PRICE, FieldType::Double),
            FieldMapping::new(fields::IMAGES, FieldType::Keyword).not_indexed(),
            FieldMapping::new(fields::CREATE_TIME, FieldType::Long),
        ])
    }
}

impl fmt::Display for ItemDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn text(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }

        write!(
            f,
            "Item{{id={}, title='{}', category='{}', brand='{}', price={}, images='{}', createTime={}}}",
            self.id,
            text(&self.title),
            text(&self.category),
            text(&self.brand),
            self.price.map(|p| p.to_string()).unwrap_or_default(),
            text(&self.images),
            self.create_time.map(|t| t.to_string()).unwrap_or_default(),
        )
    }
}
