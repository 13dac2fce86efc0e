//! Language codes used to partition content.
//!
//! Codes double as part of snapshot file names, so parsing is strict: a
//! primary subtag of two or three ASCII letters, optionally followed by one
//! `-` and a 2..=8 character alphanumeric region/variant. Input is
//! lowercased and `_` is accepted as a separator (`de_AT` → `de-at`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        let mut parts = normalized.splitn(2, '-');
        let primary = parts.next().unwrap_or_default();
        let subtag = parts.next();

        let primary_ok =
            (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_lowercase());
        let subtag_ok = subtag.is_none_or(|tag| {
            (2..=8).contains(&tag.len()) && tag.bytes().all(|b| b.is_ascii_alphanumeric())
        });

        if primary_ok && subtag_ok {
            Ok(Self(normalized))
        } else {
            Err(DomainError::invalid_language(input))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag, e.g. `de` for `de-at`.
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Pick a language from an `Accept-Language` header value.
///
/// Tags are tried in descending `q` order; the first one that parses and
/// whose primary subtag is in `supported` wins.
pub fn negotiate(header: &str, supported: &[LanguageCode]) -> Option<LanguageCode> {
    let mut candidates: Vec<(f32, LanguageCode)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next()?.trim();
            let quality = pieces
                .find_map(|piece| piece.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            let code = LanguageCode::parse(tag).ok()?;
            (quality > 0.0).then_some((quality, code))
        })
        .collect();

    // Stable sort keeps header order for equal weights.
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    candidates.into_iter().find_map(|(_, code)| {
        supported
            .iter()
            .find(|lang| lang.primary() == code.primary())
            .cloned()
    })
}
