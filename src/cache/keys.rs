//! Cache key derivation for content reads.
//!
//! Keys follow `db:<collection>:<language>:<signature>`; the signature is
//! produced by [`Query::signature`](crate::application::query::Query::signature)
//! and prefixed with the operation so `find`, `count` and `search` never
//! collide.

use crate::domain::collections::CollectionKind;
use crate::domain::language::LanguageCode;

const NAMESPACE: &str = "db";

/// Which store operation produced a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    Find,
    Count,
    Search,
}

impl ReadOp {
    fn as_str(self) -> &'static str {
        match self {
            ReadOp::Find => "find",
            ReadOp::Count => "count",
            ReadOp::Search => "search",
        }
    }
}

/// Key for one read against one partition.
pub fn content_key(
    collection: CollectionKind,
    language: &LanguageCode,
    op: ReadOp,
    signature: &str,
) -> String {
    format!(
        "{NAMESPACE}:{}:{}:{}:{signature}",
        collection.as_str(),
        language.as_str(),
        op.as_str()
    )
}

/// Prefix covering every cached read of `collection`, in any language.
pub fn collection_prefix(collection: CollectionKind) -> String {
    format!("{NAMESPACE}:{}:", collection.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).expect("valid language")
    }

    #[test]
    fn key_layout() {
        let key = content_key(
            CollectionKind::Projects,
            &lang("en"),
            ReadOp::Find,
            "{}|-|0|-",
        );
        assert_eq!(key, "db:projects:en:find:{}|-|0|-");
    }

    #[test]
    fn operations_do_not_collide() {
        let find = content_key(CollectionKind::Content, &lang("de"), ReadOp::Find, "s");
        let count = content_key(CollectionKind::Content, &lang("de"), ReadOp::Count, "s");
        assert_ne!(find, count);
    }

    #[test]
    fn prefix_matches_all_languages() {
        let prefix = collection_prefix(CollectionKind::Experiences);
        for code in ["de", "en"] {
            let key = content_key(
                CollectionKind::Experiences,
                &lang(code),
                ReadOp::Find,
                "s",
            );
            assert!(key.starts_with(&prefix));
        }
        let other = content_key(CollectionKind::Projects, &lang("de"), ReadOp::Find, "s");
        assert!(!other.starts_with(&prefix));
    }
}
