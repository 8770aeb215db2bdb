//! Item search client implementation.
//!
//! This module provides the main client for reading and writing items.
//! Application code uses it to create the index, upsert single items and run
//! searches; bulk loading goes through the pipeline crate instead.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::IndexConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::pagination::paginate;
use crate::query::QueryBuilder;
use crate::types::IndexEntry;
use item_search_shared::{
    fields, ItemDocument, Page, PageRequest, SearchCriteria, WeightedField,
};

/// The main client for interacting with the item index.
pub struct ItemSearchClient {
    backend: Arc<dyn SearchBackend>,
    config: IndexConfig,
    builder: QueryBuilder,
}

impl ItemSearchClient {
    /// Create a client for the default `item` index.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_config(backend, IndexConfig::default())
    }

    pub fn with_config(backend: Arc<dyn SearchBackend>, config: IndexConfig) -> Self {
        let builder = QueryBuilder::new(&config);
        Self {
            backend,
            config,
            builder,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Create the index if it does not exist yet.
    ///
    /// Returns `true` if this call created it.
    #[instrument(skip(self), fields(index = %self.config.name))]
    pub async fn ensure_index(&self) -> Result<bool, SearchError> {
        if self.backend.index_exists(&self.config.name).await? {
            return Ok(false);
        }

        self.backend
            .create_index(&self.config, &ItemDocument::schema())
            .await?;
        info!("Created index");
        Ok(true)
    }

    /// Write one item, replacing any item with the same id.
    pub async fn index_item(&self, item: &ItemDocument) -> Result<(), SearchError> {
        let entry = IndexEntry::try_from(item)?;
        self.backend
            .index_document(&entry, &self.config.name, &self.config.doc_type)
            .await
    }

    /// Fetch an item by id.
    ///
    /// A stored document that is not a valid item is a parse error rather
    /// than a miss.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ItemDocument>, SearchError> {
        let Some(source) = self
            .backend
            .get_document(&self.config.name, &id.to_string())
            .await?
        else {
            return Ok(None);
        };

        let item: ItemDocument = serde_json::from_value(source)
            .map_err(|e| SearchError::parse(format!("document {id}: {e}")))?;
        Ok(Some(item.with_show_time()))
    }

    pub async fn exists_by_id(&self, id: i64) -> Result<bool, SearchError> {
        Ok(self
            .backend
            .get_document(&self.config.name, &id.to_string())
            .await?
            .is_some())
    }

    pub async fn count(&self) -> Result<u64, SearchError> {
        self.backend.count(&self.config.name).await
    }

    /// Run a search and return one page of items.
    #[instrument(skip(self, criteria), fields(index = %self.config.name, page = criteria.page.page))]
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Page<ItemDocument>, SearchError> {
        let descriptor = self.builder.build(criteria)?;
        let raw = self.backend.execute_query(&descriptor).await?;

        Ok(paginate(raw, descriptor.page))
    }

    /// Items whose title matches any token of `title`.
    pub async fn find_by_title(
        &self,
        title: &str,
        page: PageRequest,
    ) -> Result<Page<ItemDocument>, SearchError> {
        let criteria = SearchCriteria::text(title)
            .in_fields(vec![WeightedField::new(fields::TITLE)])
            .with_page(page);
        self.search(&criteria).await
    }

    /// Items priced within `[lower, upper]`.
    pub async fn find_by_price_between(
        &self,
        lower: f64,
        upper: f64,
        page: PageRequest,
    ) -> Result<Page<ItemDocument>, SearchError> {
        let criteria = SearchCriteria::all()
            .with_price_between(Some(lower), Some(upper))
            .with_page(page);
        self.search(&criteria).await
    }

    pub async fn find_all(&self, page: PageRequest) -> Result<Page<ItemDocument>, SearchError> {
        self.search(&SearchCriteria::all().with_page(page)).await
    }

    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use item_search_shared::{HighlightField, SortOrder};

    async fn client_with(items: &[ItemDocument]) -> ItemSearchClient {
        let client = ItemSearchClient::new(Arc::new(MemoryBackend::new()));
        assert!(client.ensure_index().await.unwrap());
        for item in items {
            client.index_item(item).await.unwrap();
        }
        client
    }

    fn item(id: i64, title: &str, category: &str, price: f64) -> ItemDocument {
        ItemDocument::new(id)
            .with_title(title)
            .with_category(category)
            .with_brand("brand")
            .with_price(price)
            .with_images(format!("http://img.example.com/{id}.png"))
            .with_create_time(Some(1_594_898_880_000 - id * 86_400_000))
    }

    #[tokio::test]
    async fn test_ensure_index_is_idempotent() {
        let client = client_with(&[]).await;

        assert!(!client.ensure_index().await.unwrap());
        assert_eq!(client.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_and_find_by_id() {
        let client = client_with(&[item(7, "Thinking in Java", "java", 56.7)]).await;

        let found = client.find_by_id(7).await.unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("Thinking in Java"));
        assert_eq!(found.show_time.as_deref(), Some("2020-07-09 11:28:00"));

        assert!(client.exists_by_id(7).await.unwrap());
        assert!(!client.exists_by_id(8).await.unwrap());
        assert!(client.find_by_id(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_count() {
        let client = client_with(&[item(1, "Old title", "java", 10.0)]).await;

        client.index_item(&item(1, "New title", "java", 10.0)).await.unwrap();

        assert_eq!(client.count().await.unwrap(), 1);
        let found = client.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("New title"));
    }

    #[tokio::test]
    async fn test_boosted_title_outranks_category() {
        let client = client_with(&[
            item(1, "Cooking at home", "python", 10.0),
            item(2, "Learning Python", "books", 10.0),
            item(3, "Gardening", "garden", 10.0),
        ])
        .await;

        let page = client.search(&SearchCriteria::text("python")).await.unwrap();

        let ids: Vec<i64> = page.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.total_elements(), 2);
    }

    #[tokio::test]
    async fn test_images_cannot_be_searched() {
        let client = client_with(&[item(1, "Rust", "books", 10.0)]).await;
        let criteria = SearchCriteria::text("http://img.example.com/1.png")
            .in_fields(vec![WeightedField::new(fields::IMAGES)]);

        let result = client.search(&criteria).await;

        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));

        // The value is still stored and returned
        let found = client.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found.images.as_deref(), Some("http://img.example.com/1.png"));
    }

    #[tokio::test]
    async fn test_highlight_replaces_field() {
        let client = client_with(&[item(1, "Programming Rust", "books", 10.0)]).await;
        let criteria = SearchCriteria::text("rust").highlighting(HighlightField::new(fields::TITLE));

        let page = client.search(&criteria).await.unwrap();

        assert_eq!(
            page.content()[0].title.as_deref(),
            Some("Programming <span style=\"color:red\">Rust</span>")
        );
    }

    #[tokio::test]
    async fn test_find_by_price_between_inclusive() {
        let client = client_with(&[
            item(1, "a", "c", 50.0),
            item(2, "b", "c", 60.0),
            item(3, "c", "c", 70.0),
        ])
        .await;

        let page = client
            .find_by_price_between(50.0, 60.0, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_elements(), 2);
    }

    #[tokio::test]
    async fn test_find_all_paging() {
        let items: Vec<ItemDocument> = (1..=5).map(|i| item(i, "t", "c", 1.0)).collect();
        let client = client_with(&items).await;

        let page = client.find_all(PageRequest::of(2, 2)).await.unwrap();

        assert_eq!(page.content().len(), 1);
        assert_eq!(page.total_elements(), 5);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_find_by_title_sorted() {
        let client = client_with(&[
            item(1, "Rust in Action", "books", 1.0),
            item(2, "Programming Rust", "books", 1.0),
            item(3, "Go in Action", "books", 1.0),
        ])
        .await;

        let page = client.find_by_title("rust", PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements(), 2);

        let criteria = SearchCriteria::text("action")
            .in_fields(vec![WeightedField::new(fields::TITLE)])
            .sorted_by(fields::CREATE_TIME, SortOrder::Asc);
        let page = client.search(&criteria).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
