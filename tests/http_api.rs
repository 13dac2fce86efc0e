use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use folio::application::content::ContentStore;
use folio::cache::{CacheConfig, TtlCache};
use folio::config::RuntimeEnvironment;
use folio::domain::language::LanguageCode;
use folio::infra::http::{ApiRateLimiter, ApiState, build_router};
use folio::infra::snapshots::FsSnapshotRepo;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn lang(code: &str) -> LanguageCode {
    LanguageCode::parse(code).expect("valid language")
}

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    fn new(environment: RuntimeEnvironment, max_requests: u32) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        write_partition(&dir, "projects_de.json", json!([
            {"id": "p1", "slug": "requiem", "title": "Requiem", "year": 2019, "featured": true},
            {"id": "p2", "slug": "chorwerk", "title": "Chorwerk", "year": 2021, "featured": true},
            {"id": "p3", "title": "Lieder", "year": 2015, "featured": false}
        ]));
        write_partition(&dir, "projects_en.json", json!([
            {"id": "p1", "slug": "requiem", "title": "Requiem (EN)", "year": 2019, "featured": true}
        ]));
        std::fs::write(dir.path().join("content_de.json"), "not json").expect("write");

        let cache = Arc::new(TtlCache::new(&CacheConfig::default()));
        let repo = Arc::new(FsSnapshotRepo::new(dir.path()));
        let store = Arc::new(ContentStore::new(repo, cache, lang("de")));
        let limiter = Arc::new(ApiRateLimiter::new(Duration::from_secs(60), max_requests));
        let state = ApiState::new(store, limiter, vec![lang("de"), lang("en")], environment);

        Self {
            router: build_router(state),
            _dir: dir,
        }
    }

    async fn get(&self, uri: &str) -> Response {
        self.request(Request::builder().method(Method::GET).uri(uri)).await
    }

    async fn request(&self, builder: axum::http::request::Builder) -> Response {
        let request = builder.body(Body::empty()).expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }
}

fn write_partition(dir: &TempDir, name: &str, value: Value) {
    std::fs::write(dir.path().join(name), value.to_string()).expect("write partition");
}

async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn content_language(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::CONTENT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
}

fn ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .expect("array body")
        .iter()
        .filter_map(|doc| doc["id"].as_str())
        .collect()
}

#[tokio::test]
async fn health_check_returns_no_content() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);
    let response = app.get("/_health").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn list_applies_filters_sort_and_limit() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let response = app
        .get("/api/projects?featured=true&sort=year&order=desc&limit=10")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_language(&response), Some("de"));
    let body = json_body(response).await;
    assert_eq!(ids(&body), ["p2", "p1"]);
}

#[tokio::test]
async fn explicit_lang_parameter_wins_over_accept_language() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let response = app
        .request(
            Request::builder()
                .uri("/api/projects/slug/requiem?lang=de")
                .header(header::ACCEPT_LANGUAGE, "en"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "Requiem");
}

#[tokio::test]
async fn accept_language_is_negotiated() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let response = app
        .request(
            Request::builder()
                .uri("/api/projects/id/p1")
                .header(header::ACCEPT_LANGUAGE, "fr-CH, en;q=0.8, de;q=0.5"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_language(&response), Some("en"));
    assert_eq!(json_body(response).await["title"], "Requiem (EN)");
}

#[tokio::test]
async fn count_and_search_endpoints() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let count = app.get("/api/projects/count?featured=false&limit=1").await;
    assert_eq!(count.status(), StatusCode::OK);
    assert_eq!(json_body(count).await, json!({"count": 1}));

    let search = app.get("/api/projects/search?q=CHOR&fields=title").await;
    assert_eq!(search.status(), StatusCode::OK);
    assert_eq!(ids(&json_body(search).await), ["p2"]);
}

#[tokio::test]
async fn unknown_collection_and_bad_language_are_client_errors() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let unknown = app.get("/api/albums").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(unknown).await["error"]["code"],
        "unknown_collection"
    );

    let bad_lang = app.get("/api/projects?lang=../etc").await;
    assert_eq!(bad_lang.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(bad_lang).await["error"]["code"], "invalid_language");

    let bad_limit = app.get("/api/projects?limit=500").await;
    assert_eq!(bad_limit.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let response = app.get("/api/projects/slug/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn corrupt_content_hides_detail_in_production() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let response = app.get("/api/content").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "corrupt_content");
    assert!(body["error"].get("hint").is_none());
}

#[tokio::test]
async fn corrupt_content_shows_detail_in_development() {
    let app = TestApp::new(RuntimeEnvironment::Development, 100);

    let response = app.get("/api/content").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let hint = body["error"]["hint"].as_str().expect("hint present");
    assert!(hint.contains("content_de.json"), "{hint}");
}

#[tokio::test]
async fn cache_stats_reflect_cached_reads() {
    let app = TestApp::new(RuntimeEnvironment::Production, 100);

    let _ = app.get("/api/projects").await;
    let _ = app.get("/api/projects/count").await;

    let stats = app.get("/api/_cache/stats").await;
    assert_eq!(stats.status(), StatusCode::OK);
    assert_eq!(
        json_body(stats).await,
        json!({"total": 2, "active": 2, "expired": 0})
    );
}

#[tokio::test]
async fn rate_limit_rejects_with_retry_after() {
    let app = TestApp::new(RuntimeEnvironment::Production, 2);

    for _ in 0..2 {
        let response = app
            .request(
                Request::builder()
                    .uri("/api/projects")
                    .header("x-forwarded-for", "198.51.100.9"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app
        .request(
            Request::builder()
                .uri("/api/projects")
                .header("x-forwarded-for", "198.51.100.9"),
        )
        .await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
        Some("60")
    );

    let other_client = app
        .request(
            Request::builder()
                .uri("/api/projects")
                .header("x-forwarded-for", "203.0.113.1"),
        )
        .await;
    assert_eq!(other_client.status(), StatusCode::OK);
}
