//! Operations behind the command line subcommands.

use std::sync::Arc;

use clap::Args;
use tracing::{info, instrument};

use crate::config::{AppConfig, BackendKind};
use crate::AppError;
use item_search_pipeline::{demo_items, generate_items, BulkIndexer, BulkSummary};
use item_search_repository::{
    ItemSearchClient, MemoryBackend, OpenSearchBackend, SearchBackend,
};
use item_search_shared::datetime::to_epoch_millis;
use item_search_shared::{
    HighlightField, ItemDocument, MatchMode, Page, PageRequest, SearchCriteria, SortOrder,
    SortSpec, WeightedField,
};

/// Search options shared by the `search` subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Free text to match.
    #[arg(long)]
    pub text: Option<String>,

    /// Field to match the text against, optionally boosted (`title^3`). Repeatable.
    #[arg(long = "field", value_name = "NAME[^BOOST]")]
    pub fields: Vec<String>,

    /// Score each document by its best matching field.
    #[arg(long, conflicts_with = "all_fields")]
    pub best_fields: bool,

    /// Require the text to match in every field.
    #[arg(long)]
    pub all_fields: bool,

    /// Exact category.
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    /// Earliest creation time, e.g. `2020-05-01 11:28:00`.
    #[arg(long)]
    pub from: Option<String>,

    /// Latest creation time.
    #[arg(long)]
    pub to: Option<String>,

    /// Sort field replacing relevance order.
    #[arg(long, value_name = "FIELD[:asc|desc]")]
    pub sort: Option<String>,

    /// Field to highlight matches in. Repeatable.
    #[arg(long = "highlight", value_name = "FIELD")]
    pub highlight: Vec<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub size: Option<i64>,
}

impl SearchArgs {
    /// Turn the arguments into search criteria.
    ///
    /// Dates that cannot be parsed are rejected here rather than ignored.
    pub fn to_criteria(&self) -> Result<SearchCriteria, AppError> {
        let mut criteria = match &self.text {
            Some(text) => SearchCriteria::text(text.clone()),
            None => SearchCriteria::all(),
        };

        if self.best_fields {
            criteria = criteria
                .in_fields(SearchCriteria::best_field_defaults())
                .with_match_mode(MatchMode::BestFields);
        } else if self.all_fields {
            criteria = criteria.with_match_mode(MatchMode::AllFields);
        }

        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|f| parse_weighted_field(f))
                .collect::<Result<Vec<_>, _>>()?;
            criteria = criteria.in_fields(fields);
        }

        if let Some(category) = &self.category {
            criteria = criteria.with_category(category.clone());
        }
        criteria = criteria.with_price_between(self.min_price, self.max_price);

        let from = self.from.as_deref().map(parse_date_arg).transpose()?;
        let to = self.to.as_deref().map(parse_date_arg).transpose()?;
        criteria = criteria.created_between(from, to);

        if let Some(sort) = &self.sort {
            let SortSpec { field, order } = parse_sort(sort)?;
            criteria = criteria.sorted_by(field, order);
        }

        for field in &self.highlight {
            criteria = criteria.highlighting(HighlightField::new(field.clone()));
        }

        Ok(criteria.with_page(PageRequest::normalized(self.page, self.size)))
    }
}

/// Parse `name` or `name^boost`.
pub fn parse_weighted_field(value: &str) -> Result<WeightedField, AppError> {
    let (name, boost) = match value.split_once('^') {
        Some((name, boost)) => {
            let boost: f32 = boost
                .trim()
                .parse()
                .map_err(|_| AppError::invalid_argument(format!("bad boost in '{value}'")))?;
            (name.trim(), Some(boost))
        }
        None => (value.trim(), None),
    };

    if name.is_empty() {
        return Err(AppError::invalid_argument(format!("missing field name in '{value}'")));
    }

    Ok(match boost {
        Some(boost) => WeightedField::boosted(name, boost),
        None => WeightedField::new(name),
    })
}

/// Parse `field` or `field:asc|desc`. Descending is the default.
pub fn parse_sort(value: &str) -> Result<SortSpec, AppError> {
    let (field, order) = match value.rsplit_once(':') {
        Some((field, order)) => {
            let order = match order.trim().to_ascii_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                other => {
                    return Err(AppError::invalid_argument(format!(
                        "sort order must be asc or desc, got '{other}'"
                    )))
                }
            };
            (field.trim(), order)
        }
        None => (value.trim(), SortOrder::default()),
    };

    if field.is_empty() {
        return Err(AppError::invalid_argument(format!("missing sort field in '{value}'")));
    }
    Ok(SortSpec::new(field, order))
}

/// Convert a date argument to epoch milliseconds.
pub fn parse_date_arg(value: &str) -> Result<i64, AppError> {
    to_epoch_millis(value)
        .ok_or_else(|| AppError::invalid_argument(format!("cannot parse date '{value}'")))
}

/// Backend-bound components used by the commands.
pub struct Services {
    pub client: ItemSearchClient,
    pub indexer: BulkIndexer,
    pub batch_size: usize,
}

impl Services {
    /// Build the services for the configured backend.
    ///
    /// An OpenSearch backend must answer a health check. A memory backend
    /// starts out holding the demo catalogue so read commands have data.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        info!(
            backend = %config.backend,
            index = %config.index.name,
            "Initializing search backend"
        );

        match config.backend {
            BackendKind::OpenSearch => {
                let backend = OpenSearchBackend::new(&config.opensearch_url)
                    .await
                    .map_err(|e| {
                        AppError::config(format!("Failed to create OpenSearch client: {}", e))
                    })?;

                let healthy = backend.health_check().await?;
                if !healthy {
                    return Err(AppError::config("OpenSearch cluster is unhealthy"));
                }
                info!(url = %config.opensearch_url, "OpenSearch connection verified");

                Ok(Self::with_backend(Arc::new(backend), config))
            }
            BackendKind::Memory => {
                let services = Self::with_backend(Arc::new(MemoryBackend::new()), config);
                services.index_samples(chrono::Utc::now().timestamp_millis()).await?;
                Ok(services)
            }
        }
    }

    pub fn with_backend(backend: Arc<dyn SearchBackend>, config: &AppConfig) -> Self {
        Self {
            client: ItemSearchClient::with_config(backend.clone(), config.index.clone()),
            indexer: BulkIndexer::new(backend, config.index.clone()),
            batch_size: config.batch_size,
        }
    }

    /// Create the index. Returns `false` if it already existed.
    pub async fn create_index(&self) -> Result<bool, AppError> {
        Ok(self.client.ensure_index().await?)
    }

    /// Index the demo catalogue one item at a time.
    pub async fn index_samples(&self, now: i64) -> Result<usize, AppError> {
        self.client.ensure_index().await?;

        let items = demo_items(now);
        for item in &items {
            self.client.index_item(item).await?;
        }
        Ok(items.len())
    }

    pub async fn index_one(&self, item: &ItemDocument) -> Result<(), AppError> {
        self.client.ensure_index().await?;
        Ok(self.client.index_item(item).await?)
    }

    /// Generate and bulk-load `count` items.
    #[instrument(skip(self))]
    pub async fn bulk_index(
        &self,
        start_id: i64,
        count: usize,
        base_date: &str,
        batch_size: Option<usize>,
    ) -> Result<BulkSummary, AppError> {
        parse_date_arg(base_date)?;

        let items = generate_items(start_id, count, base_date);
        let batch_size = batch_size.unwrap_or(self.batch_size);
        Ok(self.indexer.submit_all(items, batch_size).await?)
    }

    pub async fn search(&self, args: &SearchArgs) -> Result<Page<ItemDocument>, AppError> {
        let criteria = args.to_criteria()?;
        Ok(self.client.search(&criteria).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use item_search_pipeline::PipelineError;
    use item_search_repository::SearchError;

    fn memory_services() -> Services {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        Services::with_backend(Arc::new(MemoryBackend::new()), &config)
    }

    #[test]
    fn test_parse_weighted_field() {
        let field = parse_weighted_field("title^3").unwrap();
        assert_eq!(field.field, "title");
        assert_eq!(field.boost, Some(3.0));

        assert_eq!(parse_weighted_field("brand").unwrap().boost, None);
        assert!(parse_weighted_field("title^x").is_err());
        assert!(parse_weighted_field("^2").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_sort("createTime:asc").unwrap(),
            SortSpec::new("createTime", SortOrder::Asc)
        );
        assert_eq!(parse_sort("price").unwrap().order, SortOrder::Desc);
        assert!(parse_sort("price:up").is_err());
        assert!(parse_sort(":asc").is_err());
    }

    #[test]
    fn test_criteria_from_args() {
        let args = SearchArgs {
            text: Some("设计".to_string()),
            best_fields: true,
            from: Some("2020-05-01 11:28:00".to_string()),
            sort: Some("createTime:desc".to_string()),
            highlight: vec!["title".to_string()],
            page: Some(-1),
            ..SearchArgs::default()
        };

        let criteria = args.to_criteria().unwrap();

        assert_eq!(criteria.match_mode, MatchMode::BestFields);
        assert_eq!(criteria.fields, SearchCriteria::best_field_defaults());
        assert_eq!(criteria.create_time.lower, Some(1_588_332_480_000));
        assert_eq!(criteria.create_time.upper, None);
        assert_eq!(criteria.sort, Some(SortSpec::new("createTime", SortOrder::Desc)));
        assert_eq!(criteria.highlight.len(), 1);
        assert_eq!(criteria.page, PageRequest::of(0, 10));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let args = SearchArgs {
            to: Some("yesterday".to_string()),
            ..SearchArgs::default()
        };

        assert!(matches!(args.to_criteria(), Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_bulk_index_then_search() {
        let services = memory_services();

        let summary = services
            .bulk_index(6, 994, "2020-07-16 11:28:00", None)
            .await
            .unwrap();
        assert_eq!((summary.documents, summary.batches), (994, 2));

        let args = SearchArgs {
            sort: Some("createTime:desc".to_string()),
            size: Some(100),
            ..SearchArgs::default()
        };
        let page = services.search(&args).await.unwrap();

        assert_eq!(page.total_elements(), 994);
        assert_eq!(page.total_pages(), 10);
        assert_eq!(page.content()[0].id, 6);
    }

    #[tokio::test]
    async fn test_bulk_index_rejects_bad_base_date() {
        let services = memory_services();

        let result = services.bulk_index(1, 10, "someday", None).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
        // Nothing was created before the argument check
        assert!(services.client.ensure_index().await.unwrap());
    }

    #[tokio::test]
    async fn test_samples_and_zero_size() {
        let services = memory_services();
        assert_eq!(services.index_samples(1_594_898_880_000).await.unwrap(), 5);

        let args = SearchArgs {
            size: Some(0),
            ..SearchArgs::default()
        };
        let result = services.search(&args).await;

        assert!(matches!(
            result,
            Err(AppError::SearchError(SearchError::InvalidQuery(_)))
        ));
    }

    #[tokio::test]
    async fn test_zero_batch_size() {
        let services = memory_services();

        let result = services.bulk_index(1, 10, "2020-07-16", Some(0)).await;

        assert!(matches!(
            result,
            Err(AppError::PipelineError(PipelineError::InvalidBatchSize(0)))
        ));
    }
}
