use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::set_request_id;

use super::{admin, comments, datasets, movies, recommendations, AppState};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(set_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Comments
        .route("/comments", post(comments::create))
        .route("/comments/:id", put(comments::update))
        .route("/users/:id/comments", get(comments::by_user))
        // Movie sentiment read models
        .route("/movies/top-rated", get(movies::top_rated))
        .route("/movies/:id/comments", get(movies::comments))
        .route("/movies/:id/sentiment", get(movies::sentiment))
        // Recommendations
        .route("/users/:id/recommendations", get(recommendations::for_user))
        .route("/recommendations/datasets", post(datasets::save))
        .route("/users/:id/recommendations/datasets", get(datasets::list_for_user))
        .route(
            "/recommendations/datasets/:id",
            get(datasets::get).delete(datasets::delete),
        )
        // Administration
        .route("/admin/sentiments/recompute", post(admin::recompute_sentiments))
        .route("/admin/sentiments/stats", get(admin::sentiment_stats))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
