//! Filesystem-backed partition snapshots.
//!
//! Each partition lives at `<root>/<collection>_<language>.json`. Writes go
//! to a sibling temporary file first and are renamed into place, so readers
//! never observe a half-written snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::application::repos::{RepoError, SnapshotRepo};
use crate::domain::collections::CollectionKind;
use crate::domain::language::LanguageCode;

#[derive(Debug, Clone)]
pub struct FsSnapshotRepo {
    root: PathBuf,
}

impl FsSnapshotRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, collection: CollectionKind, language: &LanguageCode) -> PathBuf {
        self.root
            .join(format!("{}_{}.json", collection.as_str(), language.as_str()))
    }
}

#[async_trait]
impl SnapshotRepo for FsSnapshotRepo {
    async fn read(
        &self,
        collection: CollectionKind,
        language: &LanguageCode,
    ) -> Result<Option<String>, RepoError> {
        let path = self.path_for(collection, language);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RepoError::io(path.display().to_string(), err)),
        }
    }

    async fn write(
        &self,
        collection: CollectionKind,
        language: &LanguageCode,
        contents: String,
    ) -> Result<(), RepoError> {
        let path = self.path_for(collection, language);
        let io_error = |err| RepoError::io(path.display().to_string(), err);

        fs::create_dir_all(&self.root).await.map_err(io_error)?;

        let staging = self.root.join(format!(
            ".{}_{}.{}.tmp",
            collection.as_str(),
            language.as_str(),
            Uuid::new_v4().simple()
        ));
        if let Err(err) = fs::write(&staging, contents).await {
            let _ = fs::remove_file(&staging).await;
            return Err(io_error(err));
        }
        if let Err(err) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(io_error(err));
        }
        Ok(())
    }

    fn location(&self, collection: CollectionKind, language: &LanguageCode) -> String {
        self.path_for(collection, language).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).expect("valid language")
    }

    #[tokio::test]
    async fn missing_partition_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = FsSnapshotRepo::new(dir.path());

        let read = repo
            .read(CollectionKind::Projects, &lang("en"))
            .await
            .expect("read should not fail");
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn write_then_read_uses_naming_convention() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = FsSnapshotRepo::new(dir.path().join("content"));

        repo.write(CollectionKind::Experiences, &lang("de"), "[]".to_string())
            .await
            .expect("write");

        let expected = dir.path().join("content").join("experiences_de.json");
        assert!(expected.is_file());
        assert_eq!(
            repo.read(CollectionKind::Experiences, &lang("de"))
                .await
                .expect("read")
                .as_deref(),
            Some("[]")
        );

        let leftovers = std::fs::read_dir(dir.path().join("content"))
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
