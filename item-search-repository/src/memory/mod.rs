//! In-process search backend.
//!
//! Keeps every index in memory and evaluates query descriptors directly.
//! Matching honours the index schema: keyword fields compare whole values,
//! text fields compare lower-cased tokens (CJK characters are single tokens)
//! and fields marked not indexed never match.

mod analysis;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::IndexConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::query::{BoolClause, Clause, QueryDescriptor};
use crate::types::{BackendPageResult, IndexEntry, RawHit};
use item_search_shared::{FieldType, IndexSchema, SortOrder, SortSpec};

use analysis::{highlight_text, tokenize};

struct MemoryIndex {
    schema: IndexSchema,
    documents: BTreeMap<String, Map<String, Value>>,
}

impl MemoryIndex {
    fn upsert(&mut self, entry: &IndexEntry) -> Result<(), SearchError> {
        match &entry.source {
            Value::Object(source) => {
                self.documents.insert(entry.id.clone(), source.clone());
                Ok(())
            }
            _ => Err(SearchError::index(format!(
                "document {} is not a JSON object",
                entry.id
            ))),
        }
    }

    /// Score a document against a clause. `None` means no match.
    fn score(&self, clause: &Clause, source: &Map<String, Value>) -> Option<f64> {
        match clause {
            Clause::MatchAll => Some(1.0),
            Clause::Match { field, text, boost } => {
                let mapping = self.schema.field(field).filter(|m| m.indexed)?;
                let value = source.get(field)?;
                let boost = boost.map(f64::from).unwrap_or(1.0);

                match mapping.field_type {
                    FieldType::Text => {
                        let wanted = tokenize(text);
                        if wanted.is_empty() {
                            return None;
                        }
                        let present: HashSet<String> = tokenize(value.as_str()?).into_iter().collect();
                        let matched = wanted.iter().filter(|t| present.contains(*t)).count();
                        (matched > 0).then(|| boost * matched as f64 / wanted.len() as f64)
                    }
                    FieldType::Keyword => (value.as_str()? == text).then_some(boost),
                    FieldType::Double | FieldType::Long => {
                        let wanted: f64 = text.trim().parse().ok()?;
                        (value.as_f64()? == wanted).then_some(boost)
                    }
                }
            }
            Clause::Term { field, value: wanted } => {
                let mapping = self.schema.field(field).filter(|m| m.indexed)?;
                let value = source.get(field)?;

                let matched = match mapping.field_type {
                    FieldType::Keyword => value.as_str()? == wanted,
                    FieldType::Text => tokenize(value.as_str()?).iter().any(|t| t == wanted),
                    FieldType::Double | FieldType::Long => {
                        Some(value.as_f64()?) == wanted.trim().parse::<f64>().ok()
                    }
                };
                matched.then_some(1.0)
            }
            Clause::Range(range) => {
                let mapping = self.schema.field(&range.field).filter(|m| m.indexed)?;
                if !mapping.field_type.is_numeric() {
                    return None;
                }
                let value = source.get(&range.field)?.as_f64()?;
                range.contains(value).then_some(1.0)
            }
            Clause::DisMax { queries } => queries
                .iter()
                .filter_map(|q| self.score(q, source))
                .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s)))),
            Clause::Bool(clause) => self.score_bool(clause, source),
        }
    }

    fn score_bool(&self, clause: &BoolClause, source: &Map<String, Value>) -> Option<f64> {
        let mut total = 0.0;

        for must in &clause.must {
            total += self.score(must, source)?;
        }

        let should: Vec<f64> = clause
            .should
            .iter()
            .filter_map(|s| self.score(s, source))
            .collect();

        let required = clause.minimum_should_match.unwrap_or_else(|| {
            // Without must clauses at least one should clause has to match
            u32::from(clause.must.is_empty() && !clause.should.is_empty())
        });
        if (should.len() as u32) < required {
            return None;
        }

        total += should.iter().sum::<f64>();
        if clause.must.is_empty() && clause.should.is_empty() {
            total = 1.0;
        }
        Some(total)
    }

    fn highlight(
        &self,
        descriptor: &QueryDescriptor,
        terms: &[FieldTerms],
        source: &Map<String, Value>,
    ) -> HashMap<String, Vec<String>> {
        let mut result = HashMap::new();

        for (field, terms) in descriptor.highlight.iter().zip(terms) {
            let Some(mapping) = self.schema.field(&field.field).filter(|m| m.indexed) else {
                continue;
            };
            let Some(value) = source.get(&field.field).and_then(Value::as_str) else {
                continue;
            };

            let fragment = match mapping.field_type {
                FieldType::Text => {
                    highlight_text(value, &terms.tokens, &field.pre_tag, &field.post_tag)
                }
                FieldType::Keyword if terms.phrases.contains(value) => {
                    Some(format!("{}{}{}", field.pre_tag, value, field.post_tag))
                }
                _ => None,
            };

            if let Some(fragment) = fragment {
                result.insert(field.field.clone(), vec![fragment]);
            }
        }

        result
    }
}

/// Query tokens and raw query strings a highlight on one field may mark.
///
/// Only clauses aimed at that field contribute, so a field is never marked
/// for text that matched somewhere else.
#[derive(Default)]
struct FieldTerms {
    tokens: HashSet<String>,
    phrases: HashSet<String>,
}

impl FieldTerms {
    fn collect(clause: &Clause, field: &str) -> Self {
        let mut terms = Self::default();
        terms.visit(clause, field);
        terms
    }

    fn visit(&mut self, clause: &Clause, target: &str) {
        match clause {
            Clause::Match { field, text, .. } if field == target => {
                self.tokens.extend(tokenize(text));
                self.phrases.insert(text.clone());
            }
            Clause::Term { field, value } if field == target => {
                self.tokens.insert(value.to_lowercase());
                self.phrases.insert(value.clone());
            }
            Clause::DisMax { queries } => {
                for q in queries {
                    self.visit(q, target);
                }
            }
            Clause::Bool(clause) => {
                for c in clause.must.iter().chain(clause.should.iter()) {
                    self.visit(c, target);
                }
            }
            Clause::Match { .. } | Clause::Term { .. } | Clause::MatchAll | Clause::Range(_) => {}
        }
    }
}

/// Order document ids numerically, falling back to text for non-numeric ids.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Order two field values, placing missing values last.
fn compare_field(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.as_str().unwrap_or("").cmp(b.as_str().unwrap_or("")),
        },
    };

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// A search backend that lives entirely in process memory.
///
/// Writes are visible to the next query immediately; there is no refresh
/// interval.
#[derive(Default)]
pub struct MemoryBackend {
    indices: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.indices.read().await.contains_key(index))
    }

    #[instrument(skip(self, config, schema), fields(index = %config.name))]
    async fn create_index(
        &self,
        config: &IndexConfig,
        schema: &IndexSchema,
    ) -> Result<(), SearchError> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(&config.name) {
            return Err(SearchError::index_creation(format!(
                "index {} already exists",
                config.name
            )));
        }

        indices.insert(
            config.name.clone(),
            MemoryIndex {
                schema: schema.clone(),
                documents: BTreeMap::new(),
            },
        );
        debug!("Created in-memory index");
        Ok(())
    }

    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn bulk_write(
        &self,
        batch: &[IndexEntry],
        index: &str,
        _doc_type: &str,
    ) -> Result<(), SearchError> {
        let mut indices = self.indices.write().await;
        let target = indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(index))?;

        for entry in batch {
            target
                .upsert(entry)
                .map_err(|e| SearchError::bulk_index(e.to_string()))?;
        }
        Ok(())
    }

    async fn index_document(
        &self,
        entry: &IndexEntry,
        index: &str,
        _doc_type: &str,
    ) -> Result<(), SearchError> {
        let mut indices = self.indices.write().await;
        indices
            .get_mut(index)
            .ok_or_else(|| SearchError::not_found(index))?
            .upsert(entry)
    }

    #[instrument(skip(self, query), fields(index = %query.index))]
    async fn execute_query(
        &self,
        query: &QueryDescriptor,
    ) -> Result<BackendPageResult, SearchError> {
        let indices = self.indices.read().await;
        let index = indices
            .get(&query.index)
            .ok_or_else(|| SearchError::not_found(&query.index))?;

        let mut matches: Vec<(&String, &Map<String, Value>, f64)> = index
            .documents
            .iter()
            .filter_map(|(id, source)| index.score(&query.query, source).map(|s| (id, source, s)))
            .collect();

        let sorted_by_field = !query.sort.is_empty();
        if sorted_by_field {
            matches.sort_by(|a, b| {
                query
                    .sort
                    .iter()
                    .map(|SortSpec { field, order }| compare_field(a.1.get(field), b.1.get(field), *order))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or_else(|| compare_ids(a.0, b.0))
            });
        } else {
            matches.sort_by(|a, b| {
                b.2.partial_cmp(&a.2)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| compare_ids(a.0, b.0))
            });
        }

        let terms: Vec<FieldTerms> = query
            .highlight
            .iter()
            .map(|h| FieldTerms::collect(&query.query, &h.field))
            .collect();

        let total_elements = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.size)
            .map(|(id, source, score)| RawHit {
                id: id.clone(),
                score: (!sorted_by_field).then_some(score),
                source: Value::Object(source.clone()),
                highlight: index.highlight(query, &terms, source),
            })
            .collect();

        Ok(BackendPageResult {
            total_elements,
            hits,
        })
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        let indices = self.indices.read().await;
        let index = indices.get(index).ok_or_else(|| SearchError::not_found(index))?;

        Ok(index.documents.get(id).cloned().map(Value::Object))
    }

    async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let indices = self.indices.read().await;
        let index = indices.get(index).ok_or_else(|| SearchError::not_found(index))?;

        Ok(index.documents.len() as u64)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}
