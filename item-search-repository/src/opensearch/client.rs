//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! using the OpenSearch Rust client.

use std::collections::HashMap;

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    http::response::Response,
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, CountParts, GetParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::IndexConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::opensearch::index_config::get_index_settings;
use crate::opensearch::queries::build_search_body;
use crate::query::QueryDescriptor;
use crate::types::{BackendPageResult, IndexEntry, RawHit};
use item_search_shared::IndexSchema;

/// OpenSearch backend implementation.
///
/// # Example
///
/// ```ignore
/// let backend = OpenSearchBackend::new("http://localhost:9200").await?;
/// if !backend.index_exists("item").await? {
///     backend.create_index(&IndexConfig::default(), &ItemDocument::schema()).await?;
/// }
/// ```
pub struct OpenSearchBackend {
    client: OpenSearch,
}

impl OpenSearchBackend {
    /// Create a new OpenSearch backend connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchBackend)` - A new backend instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Read an error response body for logging and error messages.
    async fn failure_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Parse a search hit into a raw hit.
    fn parse_hit(hit: &Value) -> Option<RawHit> {
        let id = hit.get("_id")?.as_str()?.to_string();
        let source = hit.get("_source")?.clone();
        let score = hit.get("_score").and_then(Value::as_f64);

        let highlight = hit
            .get("highlight")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, fragments)| {
                        let fragments = fragments
                            .as_array()
                            .map(|items| {
                                items
                                    .iter()
                                    .filter_map(|f| f.as_str().map(str::to_string))
                                    .collect()
                            })
                            .unwrap_or_default();
                        (field.clone(), fragments)
                    })
                    .collect::<HashMap<String, Vec<String>>>()
            })
            .unwrap_or_default();

        Some(RawHit {
            id,
            score,
            source,
            highlight,
        })
    }

    /// Parse a search response body into a page of raw hits.
    fn parse_search_response(body: &Value) -> Result<BackendPageResult, SearchError> {
        let hits = body
            .get("hits")
            .ok_or_else(|| SearchError::parse("search response has no hits"))?;

        // `total` is an object on OpenSearch, a bare number on older engines
        let total_elements = match hits.get("total") {
            Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
            Some(total) => total.as_u64(),
            None => None,
        }
        .ok_or_else(|| SearchError::parse("search response has no total"))?;

        let hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default();

        Ok(BackendPageResult {
            total_elements,
            hits,
        })
    }

    /// Count failed items in a bulk response body.
    fn bulk_failures(body: &Value) -> Vec<String> {
        if !body.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return Vec::new();
        }

        body.get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let action = item.get("index")?;
                        let error = action.get("error")?;
                        let id = action.get("_id").and_then(Value::as_str).unwrap_or("?");
                        Some(format!("{}: {}", id, error))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    #[instrument(skip(self))]
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        match status.as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(SearchError::query(format!(
                "Index exists check failed with status {}",
                status
            ))),
        }
    }

    #[instrument(skip(self, config, schema), fields(index = %config.name))]
    async fn create_index(
        &self,
        config: &IndexConfig,
        schema: &IndexSchema,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&config.name))
            .body(get_index_settings(config, schema))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(shards = config.shards, replicas = config.replicas, "Created index");
        Ok(())
    }

    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn bulk_write(
        &self,
        batch: &[IndexEntry],
        index: &str,
        doc_type: &str,
    ) -> Result<(), SearchError> {
        if batch.is_empty() {
            return Ok(());
        }

        // Mapping types no longer exist on OpenSearch; the type name is only
        // recorded for tracing.
        debug!(doc_type = %doc_type, "Sending bulk request");

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(batch.len() * 2);
        for entry in batch {
            body.push(json!({ "index": { "_index": index, "_id": entry.id } }).into());
            body.push(entry.source.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let failures = Self::bulk_failures(&response_body);
        if !failures.is_empty() {
            error!(failed = failures.len(), "Bulk request had item failures");
            return Err(SearchError::bulk_index(format!(
                "{} of {} documents failed: {}",
                failures.len(),
                batch.len(),
                failures.join("; ")
            )));
        }

        debug!("Bulk request acknowledged");
        Ok(())
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn index_document(
        &self,
        entry: &IndexEntry,
        index: &str,
        doc_type: &str,
    ) -> Result<(), SearchError> {
        debug!(doc_type = %doc_type, "Indexing document");

        let response = self
            .client
            .index(IndexParts::IndexId(index, &entry.id))
            .body(entry.source.clone())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, query), fields(index = %query.index))]
    async fn execute_query(
        &self,
        query: &QueryDescriptor,
    ) -> Result<BackendPageResult, SearchError> {
        let body = build_search_body(query);
        debug!(body = %body, "Executing search");

        let response = self
            .client
            .search(SearchParts::Index(&[query.index.as_str()]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            error!(status = %status, body = %error_body, "Search request failed");
            if status.as_u16() == 404 {
                return Err(SearchError::not_found(&query.index));
            }
            return Err(SearchError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let result = Self::parse_search_response(&response_body)?;
        debug!(total = result.total_elements, returned = result.hits.len(), "Search completed");
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            return Err(SearchError::query(format!(
                "Get failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        if !body.get("found").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(None);
        }
        Ok(body.get("_source").cloned())
    }

    #[instrument(skip(self))]
    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::failure_body(response).await;
            if status.as_u16() == 404 {
                return Err(SearchError::not_found(index));
            }
            return Err(SearchError::query(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::parse("count response has no count"))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let status = body.get("status").and_then(Value::as_str).unwrap_or("red");
        debug!(status = %status, "Cluster health");
        Ok(status != "red")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hit() {
        let hit = json!({
            "_id": "2",
            "_source": { "id": 2, "title": "Refactoring" },
            "_score": 1.5,
            "highlight": { "title": ["<em>Refactoring</em>"] }
        });

        let result = OpenSearchBackend::parse_hit(&hit).unwrap();

        assert_eq!(result.id, "2");
        assert_eq!(result.score, Some(1.5));
        assert_eq!(result.source["title"], "Refactoring");
        assert_eq!(result.highlight["title"], vec!["<em>Refactoring</em>".to_string()]);
    }

    #[test]
    fn test_parse_hit_sorted_without_score() {
        let hit = json!({ "_id": "3", "_source": { "id": 3 }, "_score": null });

        let result = OpenSearchBackend::parse_hit(&hit).unwrap();

        assert!(result.score.is_none());
        assert!(result.highlight.is_empty());
    }

    #[test]
    fn test_parse_hit_invalid() {
        let hit = json!({ "_score": 1.0 });

        assert!(OpenSearchBackend::parse_hit(&hit).is_none());
    }

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "hits": {
                "total": { "value": 995, "relation": "eq" },
                "hits": [
                    { "_id": "1", "_source": { "id": 1 }, "_score": 1.0 },
                    { "_id": "2", "_source": { "id": 2 }, "_score": 0.5 }
                ]
            }
        });

        let result = OpenSearchBackend::parse_search_response(&body).unwrap();

        assert_eq!(result.total_elements, 995);
        assert_eq!(result.hits.len(), 2);
    }

    #[test]
    fn test_parse_search_response_legacy_total() {
        let body = json!({ "hits": { "total": 4, "hits": [] } });

        let result = OpenSearchBackend::parse_search_response(&body).unwrap();

        assert_eq!(result.total_elements, 4);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_parse_search_response_missing_hits() {
        let result = OpenSearchBackend::parse_search_response(&json!({}));

        assert!(matches!(result, Err(SearchError::ParseError(_))));
    }

    #[test]
    fn test_bulk_failures() {
        let ok = json!({ "errors": false, "items": [] });
        assert!(OpenSearchBackend::bulk_failures(&ok).is_empty());

        let failed = json!({
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": { "_id": "2", "status": 400, "error": { "type": "mapper_parsing_exception" } } }
            ]
        });
        let failures = OpenSearchBackend::bulk_failures(&failed);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("2: "));
    }
}
