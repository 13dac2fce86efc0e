use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::query::{Filter, SortDirection};

use super::error::ApiError;

pub const MAX_PAGE_SIZE: usize = 100;

/// Parsed `GET /api/{collection}` query string. Parameters other than
/// `lang`, `sort`, `order`, `limit` and `skip` become equality filters.
#[derive(Debug, Default)]
pub struct ListParams {
    pub lang: Option<String>,
    pub sort: Option<String>,
    pub order: SortDirection,
    pub limit: Option<usize>,
    pub skip: usize,
    pub filter: Filter,
}

impl ListParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut params = ListParams::default();
        let mut filter = Filter::new();

        for (key, value) in pairs {
            match key.as_str() {
                "lang" => params.lang = Some(value),
                "sort" => {
                    let field = value.trim();
                    if field.is_empty() {
                        return Err(ApiError::bad_request(
                            "sort field must not be empty",
                            None,
                        ));
                    }
                    params.sort = Some(field.to_string());
                }
                "order" => {
                    params.order = value.parse().map_err(|_| {
                        ApiError::bad_request(
                            "order must be `asc` or `desc`",
                            Some(format!("got `{value}`")),
                        )
                    })?;
                }
                "limit" => params.limit = Some(parse_limit(&value)?),
                "skip" => {
                    params.skip = value.parse().map_err(|_| {
                        ApiError::bad_request(
                            "skip must be a non-negative integer",
                            Some(format!("got `{value}`")),
                        )
                    })?;
                }
                _ => filter = filter.eq(key, filter_value(value)),
            }
        }
        params.filter = filter;
        Ok(params)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub fields: Option<String>,
    pub limit: Option<String>,
    pub lang: Option<String>,
}

impl SearchParams {
    pub fn field_list(&self) -> Vec<String> {
        self.fields
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn parsed_limit(&self) -> Result<Option<usize>, ApiError> {
        self.limit.as_deref().map(parse_limit).transpose()
    }
}

#[derive(Debug, Deserialize)]
pub struct LangParam {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

fn parse_limit(value: &str) -> Result<usize, ApiError> {
    match value.parse::<usize>() {
        Ok(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
        _ => Err(ApiError::bad_request(
            "limit must be between 1 and 100",
            Some(format!("got `{value}`")),
        )),
    }
}

/// `true`/`false` compare as booleans; everything else as a string.
fn filter_value(raw: String) -> Value {
    match raw.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unreserved_params_become_filters() {
        let params = ListParams::from_pairs(pairs(&[
            ("lang", "en"),
            ("featured", "true"),
            ("role", "Composer"),
            ("sort", "year"),
            ("order", "desc"),
            ("limit", "5"),
            ("skip", "10"),
        ]))
        .expect("valid params");

        assert_eq!(params.lang.as_deref(), Some("en"));
        assert_eq!(params.sort.as_deref(), Some("year"));
        assert_eq!(params.order, SortDirection::Desc);
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.skip, 10);
        assert_eq!(
            params.filter,
            Filter::from([("featured", json!(true)), ("role", json!("Composer"))])
        );
    }

    #[test]
    fn limit_out_of_range_is_rejected() {
        assert!(ListParams::from_pairs(pairs(&[("limit", "0")])).is_err());
        assert!(ListParams::from_pairs(pairs(&[("limit", "101")])).is_err());
        assert!(ListParams::from_pairs(pairs(&[("limit", "ten")])).is_err());
    }

    #[test]
    fn search_fields_are_split_and_trimmed() {
        let params = SearchParams {
            q: "jazz".into(),
            fields: Some("title, description,,".into()),
            limit: None,
            lang: None,
        };
        assert_eq!(params.field_list(), ["title", "description"]);
    }
}
