//! Immutable query values evaluated in memory against a loaded partition.
//!
//! Every builder step returns a new [`Query`]; nothing is executed until a
//! store operation runs it. The cache key is derived from
//! [`Query::signature`] at execution time, so it always reflects the final
//! query state.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::collections::Document;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DomainError::validation(format!(
                "sort direction must be `asc` or `desc`, got `{other}`"
            ))),
        }
    }
}

/// Equality constraints on top-level fields, AND-combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(BTreeMap<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Combine two filters; on a shared field the constraint from `other` wins.
    pub fn merge(mut self, other: Filter) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Filter {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Filter,
    sort: Option<SortSpec>,
    limit: Option<usize>,
    skip: usize,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn filter(self, criteria: Filter) -> Self {
        Self {
            filter: self.filter.merge(criteria),
            ..self
        }
    }

    /// Replace any previous sort key.
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            sort: Some(SortSpec {
                field: field.into(),
                direction,
            }),
            ..self
        }
    }

    pub fn limit(self, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    pub fn skip(self, skip: usize) -> Self {
        Self { skip, ..self }
    }

    /// The same query with pagination dropped, as used by counts.
    pub fn unpaginated(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            sort: None,
            limit: None,
            skip: 0,
        }
    }

    pub fn filter_ref(&self) -> &Filter {
        &self.filter
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Deterministic text form of the resolved query, used in cache keys.
    pub fn signature(&self) -> String {
        // BTreeMap keys and serde_json's default (sorted) maps keep this stable.
        let filter = serde_json::to_string(&self.filter.0).unwrap_or_default();
        let sort = match &self.sort {
            Some(by) => format!(
                "{}:{}",
                Value::String(by.field.clone()),
                by.direction.as_str()
            ),
            None => "-".to_string(),
        };
        let limit = self
            .limit
            .map_or_else(|| "-".to_string(), |limit| limit.to_string());
        format!("f={filter}|s={sort}|k={}|l={limit}", self.skip)
    }

    /// Filter, sort, then paginate `docs`.
    ///
    /// Filtering and sorting are stable: records that compare equal keep
    /// their on-disk order.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| self.filter.matches(doc))
            .collect();

        if let Some(by) = &self.sort {
            matched.sort_by(|a, b| compare_by_field(a, b, by));
        }

        matched
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

fn sort_key<'a>(doc: &'a Document, field: &str) -> Option<&'a Value> {
    doc.get(field).filter(|value| !value.is_null())
}

/// Records missing the field (or holding `null`) go last in either direction.
fn compare_by_field(a: &Document, b: &Document, by: &SortSpec) -> Ordering {
    match (sort_key(a, &by.field), sort_key(b, &by.field)) {
        (Some(left), Some(right)) => {
            let ordering = compare_values(left, right);
            match by.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(left), Value::String(right)) => compare_text(left, right),
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
                l.cmp(&r)
            } else if let (Some(l), Some(r)) = (left.as_u64(), right.as_u64()) {
                l.cmp(&r)
            } else {
                let l = left.as_f64().unwrap_or(f64::NAN);
                let r = right.as_f64().unwrap_or(f64::NAN);
                l.total_cmp(&r)
            }
        }
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Array(left), Value::Array(right)) => left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.len().cmp(&right.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Collation-style order: base letters first, ignoring case and accents, so
/// "Ärger" < "Ballade" < "zugabe". Accents, then raw code points break ties.
fn compare_text(left: &str, right: &str) -> Ordering {
    collation_key(left)
        .cmp(collation_key(right))
        .then_with(|| lowercase(left).cmp(lowercase(right)))
        .then_with(|| left.cmp(right))
}

fn collation_key(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(char::to_lowercase)
}

/// Case-insensitive substring match over string fields.
///
/// With an empty `fields` list every top-level string field is searched.
pub(crate) fn matches_text(doc: &Document, needle_lower: &str, fields: &[String]) -> bool {
    let hit = |value: &Value| {
        value
            .as_str()
            .is_some_and(|text| text.to_lowercase().contains(needle_lower))
    };

    if fields.is_empty() {
        doc.values().any(hit)
    } else {
        fields
            .iter()
            .filter_map(|field| doc.get(field))
            .any(hit)
    }
}
