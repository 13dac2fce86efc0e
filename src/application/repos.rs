//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::collections::CollectionKind;
use crate::domain::language::LanguageCode;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("i/o failure at `{location}`")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl RepoError {
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source,
        }
    }
}

/// Raw access to partition snapshots: one JSON document per
/// (collection, language) pair.
#[async_trait]
pub trait SnapshotRepo: Send + Sync {
    /// Full snapshot text, or `None` when the partition does not exist.
    async fn read(
        &self,
        collection: CollectionKind,
        language: &LanguageCode,
    ) -> Result<Option<String>, RepoError>;

    /// Replace the whole partition with `contents`.
    async fn write(
        &self,
        collection: CollectionKind,
        language: &LanguageCode,
        contents: String,
    ) -> Result<(), RepoError>;

    /// Human-readable location of the partition, for diagnostics.
    fn location(&self, collection: CollectionKind, language: &LanguageCode) -> String;
}
