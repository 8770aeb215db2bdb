//! Application configuration.
//!
//! Settings come from the environment, optionally seeded from a `.env` file,
//! and may be overridden by global command line flags.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::AppError;
use item_search_pipeline::DEFAULT_BATCH_SIZE;
use item_search_repository::config::{DEFAULT_DOC_TYPE, DEFAULT_INDEX_NAME};
use item_search_repository::IndexConfig;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Which search backend commands run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    OpenSearch,
    /// In-process index, discarded when the command exits.
    Memory,
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opensearch" => Ok(BackendKind::OpenSearch),
            "memory" => Ok(BackendKind::Memory),
            other => Err(AppError::config(format!(
                "unknown search backend '{other}' (expected opensearch or memory)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::OpenSearch => write!(f, "opensearch"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

/// Resolved settings for one run of the tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub opensearch_url: String,
    pub index: IndexConfig,
    /// Documents per bulk write.
    pub batch_size: usize,
    pub backend: BackendKind,
}

impl AppConfig {
    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_NAME`: index name (default: item)
    /// - `INDEX_TYPE`: document type name (default: docs)
    /// - `INDEX_SHARDS` / `INDEX_REPLICAS`: used on index creation (default: 5 / 1)
    /// - `TEXT_ANALYZER`: analyzer for text fields (default: backend default)
    /// - `BULK_BATCH_SIZE`: documents per bulk write (default: 500)
    /// - `SEARCH_BACKEND`: `opensearch` or `memory` (default: opensearch)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their defaults; malformed numbers are
    /// errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let shards = parse_number(&get, "INDEX_SHARDS", 5u32)?;
        let replicas = parse_number(&get, "INDEX_REPLICAS", 1u32)?;
        let batch_size = parse_number(&get, "BULK_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(AppError::config("BULK_BATCH_SIZE must be at least 1"));
        }

        let mut index = IndexConfig::new(
            get("INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
        )
        .with_doc_type(get("INDEX_TYPE").unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()))
        .with_shards(shards, replicas);
        if let Some(analyzer) = get("TEXT_ANALYZER") {
            index = index.with_text_analyzer(analyzer);
        }

        let backend = match get("SEARCH_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };

        Ok(Self {
            opensearch_url: get("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index,
            batch_size,
            backend,
        })
    }
}

fn parse_number<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("{key}={value}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.opensearch_url, "http://localhost:9200");
        assert_eq!(config.index, IndexConfig::default());
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.backend, BackendKind::OpenSearch);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("OPENSEARCH_URL", "http://search:9200"),
            ("INDEX_NAME", "products"),
            ("INDEX_TYPE", "doc"),
            ("INDEX_SHARDS", "1"),
            ("INDEX_REPLICAS", "0"),
            ("TEXT_ANALYZER", "ik_max_word"),
            ("BULK_BATCH_SIZE", "200"),
            ("SEARCH_BACKEND", "Memory"),
        ])
        .unwrap();

        assert_eq!(config.opensearch_url, "http://search:9200");
        assert_eq!(config.index.name, "products");
        assert_eq!(config.index.doc_type, "doc");
        assert_eq!((config.index.shards, config.index.replicas), (1, 0));
        assert_eq!(config.index.text_analyzer.as_deref(), Some("ik_max_word"));
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.backend, BackendKind::Memory);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = load(&[("INDEX_NAME", ""), ("BULK_BATCH_SIZE", " ")]).unwrap();

        assert_eq!(config.index.name, "item");
        assert_eq!(config.batch_size, 500);
    }

    #[test]
    fn test_malformed_values() {
        assert!(matches!(
            load(&[("INDEX_SHARDS", "five")]),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            load(&[("BULK_BATCH_SIZE", "0")]),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            load(&[("SEARCH_BACKEND", "solr")]),
            Err(AppError::ConfigError(_))
        ));
    }
}
