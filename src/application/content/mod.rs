//! Cache-aside, queryable access to content partitions.
//!
//! Reads compute a key from (collection, language, resolved query), return
//! the cached result when present, and otherwise load the partition
//! snapshot, evaluate the query in memory and populate the cache. A missing
//! partition falls back to the default language and then to an empty
//! result; a partition that exists but cannot be read or parsed is an error.

mod collection;
mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

pub use collection::{Collection, QueryBuilder};

use crate::application::query::{Filter, Query, matches_text};
use crate::application::repos::{RepoError, SnapshotRepo};
use crate::cache::{ReadOp, SharedCache, content_key};
use crate::domain::collections::{CollectionKind, Document, Record};
use crate::domain::error::DomainError;
use crate::domain::language::LanguageCode;

const SOURCE: &str = "application::content::ContentStore";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("snapshot `{location}` ({collection}/{language}) is corrupt: {reason}")]
    Corrupt {
        collection: CollectionKind,
        language: LanguageCode,
        location: String,
        reason: String,
    },
    #[error("record in `{collection}` does not match its schema")]
    Schema {
        collection: CollectionKind,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("failed to encode snapshot for `{collection}`")]
    Encode {
        collection: CollectionKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Options for [`ContentStore::search`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub language: LanguageCode,
    /// Restrict matching to these fields; empty means every string field.
    pub fields: Vec<String>,
    pub limit: Option<usize>,
}

impl SearchOptions {
    pub fn new(language: LanguageCode) -> Self {
        Self {
            language,
            fields: Vec::new(),
            limit: None,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub struct ContentStore {
    repo: Arc<dyn SnapshotRepo>,
    cache: SharedCache,
    default_language: LanguageCode,
    ttl: Duration,
    /// Bumped after every snapshot write and folded into cache keys, so a
    /// read that loaded a partition before the write can only populate keys
    /// no later read will ask for.
    generations: DashMap<CollectionKind, u64>,
}

impl ContentStore {
    /// Build a store whose cached reads live for the cache's default TTL.
    pub fn new(
        repo: Arc<dyn SnapshotRepo>,
        cache: SharedCache,
        default_language: LanguageCode,
    ) -> Self {
        let ttl = cache.default_ttl();
        Self {
            repo,
            cache,
            default_language,
            ttl,
            generations: DashMap::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default_language
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Typed handle on the partition of `R`'s collection for `language`.
    pub fn collection<R: Record>(&self, language: &LanguageCode) -> Collection<'_, R> {
        Collection::new(self, R::COLLECTION, language.clone(), decode_record::<R>)
    }

    /// Untyped handle yielding raw documents, for callers that only know the
    /// collection at runtime.
    pub fn documents(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
    ) -> Collection<'_, Document> {
        Collection::new(self, kind, language.clone(), Ok)
    }

    pub async fn get_by_id<R: Record>(
        &self,
        id: &str,
        language: &LanguageCode,
    ) -> Result<Option<R>, ContentError> {
        self.collection::<R>(language)
            .find_one(Filter::new().eq("id", id))
            .await
    }

    /// Records without a `slug` field never match.
    pub async fn get_by_slug<R: Record>(
        &self,
        slug: &str,
        language: &LanguageCode,
    ) -> Result<Option<R>, ContentError> {
        self.collection::<R>(language)
            .find_one(Filter::new().eq("slug", slug))
            .await
    }

    pub async fn search<R: Record>(
        &self,
        term: &str,
        options: &SearchOptions,
    ) -> Result<Vec<R>, ContentError> {
        self.search_documents(R::COLLECTION, term, options)
            .await?
            .into_iter()
            .map(|doc| decode_record::<R>(doc).map_err(|err| schema_error(R::COLLECTION, err)))
            .collect()
    }

    /// Case-insensitive substring search; a blank term matches nothing.
    pub async fn search_documents(
        &self,
        kind: CollectionKind,
        term: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Document>, ContentError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let signature = format!(
            "q={}|f={}|l={}",
            Value::String(needle.clone()),
            serde_json::to_string(&options.fields).unwrap_or_default(),
            options
                .limit
                .map_or_else(|| "-".to_string(), |limit| limit.to_string())
        );
        let key = self.cache_key(kind, &options.language, ReadOp::Search, &signature);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(documents_from_value(cached));
        }

        let docs = self.load_partition(kind, &options.language).await?;
        let found: Vec<Document> = docs
            .into_iter()
            .filter(|doc| matches_text(doc, &needle, &options.fields))
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();

        self.cache.set(key, documents_to_value(&found), self.ttl);
        Ok(found)
    }

    pub(crate) async fn run_find(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
        query: &Query,
    ) -> Result<Vec<Document>, ContentError> {
        let key = self.cache_key(kind, language, ReadOp::Find, &query.signature());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(documents_from_value(cached));
        }

        let docs = self.load_partition(kind, language).await?;
        let result = query.apply(docs);
        self.cache.set(key, documents_to_value(&result), self.ttl);
        Ok(result)
    }

    pub(crate) async fn run_count(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
        query: &Query,
    ) -> Result<usize, ContentError> {
        let query = query.unpaginated();
        let key = self.cache_key(kind, language, ReadOp::Count, &query.signature());
        if let Some(count) = self.cache.get(&key).and_then(|value| value.as_u64()) {
            return Ok(count as usize);
        }

        let docs = self.load_partition(kind, language).await?;
        let count = docs
            .iter()
            .filter(|doc| query.filter_ref().matches(doc))
            .count();
        self.cache.set(key, Value::from(count), self.ttl);
        Ok(count)
    }

    fn cache_key(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
        op: ReadOp,
        signature: &str,
    ) -> String {
        let generation = self.generations.get(&kind).map_or(0, |entry| *entry);
        content_key(kind, language, op, &format!("g{generation}|{signature}"))
    }

    pub(crate) fn bump_generation(&self, kind: CollectionKind) {
        *self.generations.entry(kind).or_insert(0) += 1;
    }

    /// Candidate partitions in fallback order: the requested language, its
    /// primary subtag, then the default language.
    fn fallback_chain(&self, language: &LanguageCode) -> Vec<LanguageCode> {
        let mut chain = vec![language.clone()];
        if let Ok(primary) = LanguageCode::parse(language.primary()) {
            if !chain.contains(&primary) {
                chain.push(primary);
            }
        }
        if !chain.contains(&self.default_language) {
            chain.push(self.default_language.clone());
        }
        chain
    }

    async fn load_partition(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
    ) -> Result<Vec<Document>, ContentError> {
        for candidate in self.fallback_chain(language) {
            let raw = self.repo.read(kind, &candidate).await.inspect_err(|err| {
                error!(
                    target = "folio::content",
                    source = SOURCE,
                    collection = %kind,
                    language = %candidate,
                    location = %self.repo.location(kind, &candidate),
                    error = %err,
                    "Failed to read content snapshot"
                );
            })?;

            match raw {
                Some(raw) => return self.parse_partition(kind, &candidate, &raw),
                None => debug!(
                    target = "folio::content",
                    collection = %kind,
                    language = %candidate,
                    requested = %language,
                    "Snapshot missing, trying next fallback"
                ),
            }
        }

        Ok(Vec::new())
    }

    fn parse_partition(
        &self,
        kind: CollectionKind,
        language: &LanguageCode,
        raw: &str,
    ) -> Result<Vec<Document>, ContentError> {
        let corrupt = |reason: String| {
            let location = self.repo.location(kind, language);
            error!(
                target = "folio::content",
                source = SOURCE,
                collection = %kind,
                language = %language,
                location = %location,
                reason = %reason,
                "Content snapshot is corrupt"
            );
            ContentError::Corrupt {
                collection: kind,
                language: language.clone(),
                location,
                reason,
            }
        };

        let values: Vec<Value> = serde_json::from_str(raw)
            .map_err(|err| corrupt(format!("expected a JSON array of records: {err}")))?;

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(doc) => Ok(doc),
                other => Err(corrupt(format!(
                    "record {index} is {} instead of an object",
                    json_kind(&other)
                ))),
            })
            .collect()
    }
}

fn decode_record<R: Record>(doc: Document) -> Result<R, serde_json::Error> {
    serde_json::from_value(Value::Object(doc))
}

fn schema_error(collection: CollectionKind, source: serde_json::Error) -> ContentError {
    ContentError::Schema { collection, source }
}

fn documents_to_value(docs: &[Document]) -> Value {
    Value::Array(docs.iter().cloned().map(Value::Object).collect())
}

fn documents_from_value(value: Value) -> Vec<Document> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(doc) => Some(doc),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
