//! Index schema derived from the document model.

use serde::{Deserialize, Serialize};

/// Storage type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Tokenized and matched by relevance.
    Text,
    /// Compared by exact value.
    Keyword,
    Double,
    Long,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Double => "double",
            FieldType::Long => "long",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Double | FieldType::Long)
    }
}

/// Mapping of a single document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    pub field_type: FieldType,
    /// Whether the field participates in matching at all.
    pub indexed: bool,
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexed: true,
        }
    }

    /// Keep the field in the stored source but out of the index.
    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    pub fn is_analyzed(&self) -> bool {
        self.indexed && self.field_type == FieldType::Text
    }
}

/// Ordered set of field mappings for one index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexSchema {
    fields: Vec<FieldMapping>,
}

impl IndexSchema {
    pub fn new(fields: Vec<FieldMapping>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let schema = IndexSchema::new(vec![
            FieldMapping::new("a", FieldType::Text),
            FieldMapping::new("b", FieldType::Long).not_indexed(),
        ]);

        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field("a").unwrap().is_analyzed());
        assert!(!schema.field("b").unwrap().is_analyzed());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::Keyword.as_str(), "keyword");
        assert!(FieldType::Double.is_numeric());
        assert!(!FieldType::Text.is_numeric());
    }
}
