use crate::application::query::{Filter, Query, SortDirection};
use crate::domain::collections::{CollectionKind, Document};
use crate::domain::language::LanguageCode;

use super::{ContentError, ContentStore, schema_error};

type Decode<T> = fn(Document) -> Result<T, serde_json::Error>;

/// Handle on one (collection, language) partition.
pub struct Collection<'s, T> {
    store: &'s ContentStore,
    kind: CollectionKind,
    language: LanguageCode,
    decode: Decode<T>,
}

impl<T> Clone for Collection<'_, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            kind: self.kind,
            language: self.language.clone(),
            decode: self.decode,
        }
    }
}

impl<'s, T> Collection<'s, T> {
    pub(super) fn new(
        store: &'s ContentStore,
        kind: CollectionKind,
        language: LanguageCode,
        decode: Decode<T>,
    ) -> Self {
        Self {
            store,
            kind,
            language,
            decode,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    /// Start a query; pass `Filter::new()` to match everything.
    pub fn find(&self, filter: Filter) -> QueryBuilder<'s, T> {
        QueryBuilder {
            collection: self.clone(),
            query: Query::new(filter),
        }
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>, ContentError> {
        self.find(filter).first().await
    }

    /// Number of records matching `filter`, independent of any pagination.
    pub async fn count(&self, filter: Filter) -> Result<usize, ContentError> {
        self.store
            .run_count(self.kind, &self.language, &Query::new(filter))
            .await
    }
}

/// A [`Query`] bound to a partition. Each step returns a new builder; the
/// query only runs on [`to_array`](Self::to_array) or [`first`](Self::first).
pub struct QueryBuilder<'s, T> {
    collection: Collection<'s, T>,
    query: Query,
}

impl<T> Clone for QueryBuilder<'_, T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            query: self.query.clone(),
        }
    }
}

impl<'s, T> QueryBuilder<'s, T> {
    pub fn filter(self, criteria: Filter) -> Self {
        self.map(|query| query.filter(criteria))
    }

    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.map(|query| query.sort(field, direction))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.map(|query| query.limit(limit))
    }

    pub fn skip(self, skip: usize) -> Self {
        self.map(|query| query.skip(skip))
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub async fn to_array(&self) -> Result<Vec<T>, ContentError> {
        let Collection {
            store,
            kind,
            language,
            decode,
        } = &self.collection;

        store
            .run_find(*kind, language, &self.query)
            .await?
            .into_iter()
            .map(|doc| decode(doc).map_err(|err| schema_error(*kind, err)))
            .collect()
    }

    pub async fn first(&self) -> Result<Option<T>, ContentError> {
        let first = self.clone().limit(1).to_array().await?;
        Ok(first.into_iter().next())
    }

    fn map(self, step: impl FnOnce(Query) -> Query) -> Self {
        Self {
            collection: self.collection,
            query: step(self.query),
        }
    }
}
