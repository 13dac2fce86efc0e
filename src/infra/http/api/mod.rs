pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{Router, middleware as axum_middleware, routing::get};

pub fn build_api_router(state: ApiState) -> Router {
    let rate_state = state.clone();

    Router::new()
        .route("/api/_cache/stats", get(handlers::cache_stats))
        .route("/api/{collection}", get(handlers::list_documents))
        .route("/api/{collection}/count", get(handlers::count_documents))
        .route("/api/{collection}/search", get(handlers::search_documents))
        .route("/api/{collection}/id/{id}", get(handlers::get_by_id))
        .route("/api/{collection}/slug/{slug}", get(handlers::get_by_slug))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::api_rate_limit,
        ))
}
