//! The write path: whole-partition snapshot replacement.

use std::collections::HashSet;

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::cache::collection_prefix;
use crate::domain::collections::{
    CollectionKind, ContentEntry, Document, Experience, Project, Record,
};
use crate::domain::error::DomainError;
use crate::domain::language::LanguageCode;

use super::{ContentError, ContentStore, schema_error};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

impl ContentStore {
    /// Replace the partition of `R`'s collection for `language` with `records`.
    ///
    /// Returns the number of records written.
    pub async fn save_snapshot<R: Record>(
        &self,
        records: &[R],
        language: &LanguageCode,
    ) -> Result<usize, ContentError> {
        let docs = records
            .iter()
            .map(|record| match serde_json::to_value(record) {
                Ok(Value::Object(doc)) => Ok(doc),
                Ok(_) => Err(ContentError::Validation(DomainError::validation(format!(
                    "`{}` records must serialize to JSON objects",
                    R::COLLECTION
                )))),
                Err(source) => Err(ContentError::Encode {
                    collection: R::COLLECTION,
                    source,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.write_partition(R::COLLECTION, docs, language).await
    }

    /// Like [`save_snapshot`](Self::save_snapshot) for documents whose
    /// collection is only known at runtime. Each document must decode into
    /// the collection's schema.
    pub async fn save_documents(
        &self,
        kind: CollectionKind,
        docs: Vec<Document>,
        language: &LanguageCode,
    ) -> Result<usize, ContentError> {
        for doc in &docs {
            check_schema(kind, doc)?;
        }
        self.write_partition(kind, docs, language).await
    }

    async fn write_partition(
        &self,
        kind: CollectionKind,
        mut docs: Vec<Document>,
        language: &LanguageCode,
    ) -> Result<usize, ContentError> {
        ensure_unique(kind, &docs, "id")?;
        ensure_unique(kind, &docs, "slug")?;

        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| DomainError::validation(format!("cannot format timestamp: {err}")))?;
        for doc in &mut docs {
            stamp(doc, &now);
        }

        let count = docs.len();
        let body = serde_json::to_string_pretty(&Value::Array(
            docs.into_iter().map(Value::Object).collect(),
        ))
        .map_err(|source| ContentError::Encode {
            collection: kind,
            source,
        })?;

        self.repo.write(kind, language, body).await?;
        self.bump_generation(kind);
        let invalidated = self.cache.delete_prefix(&collection_prefix(kind));

        info!(
            target = "folio::content",
            collection = %kind,
            language = %language,
            records = count,
            invalidated,
            location = %self.repo.location(kind, language),
            "Saved content snapshot"
        );

        Ok(count)
    }
}

fn stamp(doc: &mut Document, now: &str) {
    doc.insert(UPDATED_AT.to_string(), Value::String(now.to_string()));
    let has_created = doc.get(CREATED_AT).is_some_and(|value| !value.is_null());
    if !has_created {
        doc.insert(CREATED_AT.to_string(), Value::String(now.to_string()));
    }
}

/// `field` must not repeat within a partition; records where it is absent,
/// `null` or an empty string are exempt.
fn ensure_unique(kind: CollectionKind, docs: &[Document], field: &str) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for value in docs
        .iter()
        .filter_map(|doc| doc.get(field))
        .filter(|value| !value.is_null() && value.as_str() != Some(""))
    {
        if !seen.insert(value.to_string()) {
            return Err(DomainError::validation(format!(
                "duplicate {field} {value} in `{kind}`"
            )));
        }
    }
    Ok(())
}

fn check_schema(kind: CollectionKind, doc: &Document) -> Result<(), ContentError> {
    let value = Value::Object(doc.clone());
    let result = match kind {
        CollectionKind::Projects => serde_json::from_value::<Project>(value).map(drop),
        CollectionKind::Experiences => serde_json::from_value::<Experience>(value).map(drop),
        CollectionKind::Content => serde_json::from_value::<ContentEntry>(value).map(drop),
    };
    result.map_err(|err| schema_error(kind, err))
}
