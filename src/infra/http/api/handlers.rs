use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::content::SearchOptions;
use crate::application::query::Filter;
use crate::domain::collections::CollectionKind;
use crate::domain::language::{LanguageCode, negotiate};

use super::error::{ApiError, content_to_api};
use super::models::{CountResponse, LangParam, ListParams, SearchParams};
use super::state::ApiState;

pub async fn list_documents(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let kind = parse_collection(&collection)?;
    let params = ListParams::from_pairs(pairs)?;
    let language = resolve_language(&state, params.lang.as_deref(), &headers)?;

    let mut query = state
        .store
        .documents(kind, &language)
        .find(params.filter)
        .skip(params.skip);
    if let Some(field) = params.sort {
        query = query.sort(field, params.order);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    let docs = query
        .to_array()
        .await
        .map_err(|err| content_to_api(err, state.expose_error_detail()))?;

    Ok(localized(&language, docs))
}

pub async fn count_documents(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let kind = parse_collection(&collection)?;
    let params = ListParams::from_pairs(pairs)?;
    let language = resolve_language(&state, params.lang.as_deref(), &headers)?;

    let count = state
        .store
        .documents(kind, &language)
        .count(params.filter)
        .await
        .map_err(|err| content_to_api(err, state.expose_error_detail()))?;

    Ok(localized(&language, CountResponse { count }))
}

pub async fn search_documents(
    State(state): State<ApiState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let kind = parse_collection(&collection)?;
    let language = resolve_language(&state, params.lang.as_deref(), &headers)?;

    let mut options = SearchOptions::new(language.clone()).fields(params.field_list());
    if let Some(limit) = params.parsed_limit()? {
        options = options.limit(limit);
    }

    let docs = state
        .store
        .search_documents(kind, &params.q, &options)
        .await
        .map_err(|err| content_to_api(err, state.expose_error_detail()))?;

    Ok(localized(&language, docs))
}

pub async fn get_by_id(
    State(state): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Query<LangParam>,
) -> Result<Response, ApiError> {
    find_single(&state, &collection, "id", id, params.lang.as_deref(), &headers).await
}

pub async fn get_by_slug(
    State(state): State<ApiState>,
    Path((collection, slug)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Query<LangParam>,
) -> Result<Response, ApiError> {
    find_single(
        &state,
        &collection,
        "slug",
        slug,
        params.lang.as_deref(),
        &headers,
    )
    .await
}

pub async fn cache_stats(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.cache().stats())
}

async fn find_single(
    state: &ApiState,
    collection: &str,
    field: &'static str,
    value: String,
    lang: Option<&str>,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let kind = parse_collection(collection)?;
    let language = resolve_language(state, lang, headers)?;

    let doc = state
        .store
        .documents(kind, &language)
        .find_one(Filter::new().eq(field, value))
        .await
        .map_err(|err| content_to_api(err, state.expose_error_detail()))?;

    match doc {
        Some(doc) => Ok(localized(&language, doc)),
        None => Err(ApiError::not_found("record not found")),
    }
}

fn parse_collection(name: &str) -> Result<CollectionKind, ApiError> {
    name.parse::<CollectionKind>().map_err(ApiError::from)
}

/// Explicit `lang` parameter, else the best `Accept-Language` match among
/// the offered languages, else the store default.
fn resolve_language(
    state: &ApiState,
    explicit: Option<&str>,
    headers: &HeaderMap,
) -> Result<LanguageCode, ApiError> {
    if let Some(code) = explicit {
        return LanguageCode::parse(code).map_err(ApiError::from);
    }

    let negotiated = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| negotiate(value, &state.languages));

    Ok(negotiated.unwrap_or_else(|| state.store.default_language().clone()))
}

fn localized<T: Serialize>(language: &LanguageCode, body: T) -> Response {
    (
        [(header::CONTENT_LANGUAGE, language.to_string())],
        Json(body),
    )
        .into_response()
}
