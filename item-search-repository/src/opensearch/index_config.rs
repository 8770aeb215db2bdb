//! OpenSearch index settings and mappings.
//!
//! This module renders an [`IndexConfig`] and the item schema into the body
//! of a create-index request.

use serde_json::{json, Map, Value};

use crate::config::IndexConfig;
use item_search_shared::{FieldType, IndexSchema};

/// Get the index settings and mappings for the item index.
///
/// The mappings include:
/// - **text** fields with the configured analyzer, if any
/// - **keyword** fields for exact matching
/// - numeric fields for ranges and sorting
/// - `"index": false` for fields kept only for display
pub fn get_index_settings(config: &IndexConfig, schema: &IndexSchema) -> Value {
    let mut properties = Map::new();

    for field in schema.fields() {
        let mut mapping = Map::new();
        mapping.insert("type".to_string(), json!(field.field_type.as_str()));

        if !field.indexed {
            mapping.insert("index".to_string(), json!(false));
        } else if field.field_type == FieldType::Text {
            if let Some(analyzer) = &config.text_analyzer {
                mapping.insert("analyzer".to_string(), json!(analyzer));
            }
        }

        properties.insert(field.name.clone(), Value::Object(mapping));
    }

    json!({
        "settings": {
            "number_of_shards": config.shards,
            "number_of_replicas": config.replicas
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use item_search_shared::ItemDocument;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings(&IndexConfig::default(), &ItemDocument::schema());

        assert_eq!(settings["settings"]["number_of_shards"], 5);
        assert_eq!(settings["settings"]["number_of_replicas"], 1);

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["title"]["type"], "text");
        assert!(properties["title"].get("analyzer").is_none());
        assert_eq!(properties["category"]["type"], "keyword");
        assert_eq!(properties["brand"]["type"], "keyword");
        assert_eq!(properties["price"]["type"], "double");
        assert_eq!(properties["createTime"]["type"], "long");
        assert_eq!(properties["id"]["type"], "long");
    }

    #[test]
    fn test_images_not_indexed() {
        let settings = get_index_settings(&IndexConfig::default(), &ItemDocument::schema());

        let images = &settings["mappings"]["properties"]["images"];
        assert_eq!(images["type"], "keyword");
        assert_eq!(images["index"], false);
    }

    #[test]
    fn test_text_analyzer() {
        let config = IndexConfig::default().with_text_analyzer("ik_max_word");

        let settings = get_index_settings(&config, &ItemDocument::schema());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["title"]["analyzer"], "ik_max_word");
        assert!(properties["category"].get("analyzer").is_none());
    }
}
