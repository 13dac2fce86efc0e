//! Supported content collections and their record schemas.
//!
//! Each collection is a closed [`CollectionKind`] variant tied to one typed
//! schema through the [`Record`] trait. Stored records may carry fields the
//! schema does not name; they are kept in `extra` and written back untouched.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DomainError;

/// A record as stored on disk: a JSON object addressable by field name.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Projects,
    Experiences,
    Content,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Projects,
        CollectionKind::Experiences,
        CollectionKind::Content,
    ];

    /// Name used in snapshot file names, cache keys and URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Projects => "projects",
            CollectionKind::Experiences => "experiences",
            CollectionKind::Content => "content",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::unknown_collection(s))
    }
}

/// Typed schema bound to exactly one collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: CollectionKind;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for Project {
    const COLLECTION: CollectionKind = CollectionKind::Projects;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    /// `None` while the engagement is ongoing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for Experience {
    const COLLECTION: CollectionKind = CollectionKind::Experiences;
}

/// Generic editorial content: blog posts, release notes, news.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for ContentEntry {
    const COLLECTION: CollectionKind = CollectionKind::Content;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for kind in CollectionKind::ALL {
            assert_eq!(kind.as_str().parse::<CollectionKind>(), Ok(kind));
        }
        assert_eq!(
            "blog".parse::<CollectionKind>(),
            Err(DomainError::unknown_collection("blog"))
        );
    }

    #[test]
    fn unknown_fields_survive_in_extra() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "title": "Tidal Drift",
            "coverImage": "/img/drift.jpg",
            "spotifyId": "abc123"
        }))
        .expect("valid project");

        assert_eq!(project.cover_image.as_deref(), Some("/img/drift.jpg"));
        assert_eq!(project.extra.get("spotifyId"), Some(&json!("abc123")));

        let value = serde_json::to_value(&project).expect("serialize");
        assert_eq!(value["spotifyId"], json!("abc123"));
        assert!(value.get("slug").is_none());
    }
}
