use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use cinesense_api::api::{create_router, AppState};
use cinesense_api::db::{MemoryStore, ReviewStore};
use cinesense_api::services::SentimentResolver;

const POSITIVE_TEXT: &str = "Esta película es excelente, la recomiendo totalmente";
const NEGATIVE_TEXT: &str = "Pésima, un desastre total, no la recomiendo";

fn create_test_server(store: Arc<MemoryStore>) -> TestServer {
    let state = AppState::with_resolver(store, SentimentResolver::lexicon_only());
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn seeded_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.add_movie("Alien", "sci-fi", "Ridley Scott").await;
    store.add_movie("Blade Runner", "sci-fi", "Denis Villeneuve").await;
    store.add_movie("Heat", "crime", "Michael Mann").await;
    let server = create_test_server(store.clone());
    (server, store)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = seeded_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (server, _) = seeded_server().await;
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_create_comment_scores_sentiment() {
    let (server, _) = seeded_server().await;

    let response = server
        .post("/api/v1/comments")
        .json(&json!({
            "user_id": 1,
            "movie_id": 1,
            "content": POSITIVE_TEXT
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let comment: serde_json::Value = response.json();
    assert_eq!(comment["sentiment"], "positive");
    assert!(comment["sentiment_score"].as_f64().unwrap() >= 7.0);

    // The movie aggregate now reflects the single comment.
    let response = server.get("/api/v1/movies/1/sentiment").await;
    response.assert_status_ok();
    let sentiment: serde_json::Value = response.json();
    assert_eq!(sentiment["comment_count"], 1);
    assert_eq!(sentiment["sentiment"], "positive");
}

#[tokio::test]
async fn test_duplicate_comment_is_conflict() {
    let (server, _) = seeded_server().await;

    let body = json!({ "user_id": 1, "movie_id": 1, "content": POSITIVE_TEXT });
    server.post("/api/v1/comments").json(&body).await.assert_status(axum::http::StatusCode::CREATED);

    let response = server.post("/api/v1/comments").json(&body).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let error: serde_json::Value = response.json();
    assert!(error["error"].as_str().unwrap().contains("already commented"));

    // No second row was written.
    let response = server.get("/api/v1/users/1/comments").await;
    let comments: Vec<serde_json::Value> = response.json();
    assert_eq!(comments.len(), 1);
}

#[tokio::test]
async fn test_empty_content_is_rejected() {
    let (server, _) = seeded_server().await;

    let response = server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 1, "content": "   " }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_commenting_unknown_movie_is_not_found() {
    let (server, _) = seeded_server().await;

    let response = server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 404, "content": POSITIVE_TEXT }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_comment_rescores() {
    let (server, _) = seeded_server().await;

    let created: serde_json::Value = server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 1, "content": POSITIVE_TEXT }))
        .await
        .json();

    let response = server
        .put(&format!("/api/v1/comments/{}", created["id"]))
        .json(&json!({ "content": NEGATIVE_TEXT }))
        .await;

    response.assert_status_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["sentiment"], "negative");
    assert!(updated["sentiment_score"].as_f64().unwrap() <= 4.0);
}

#[tokio::test]
async fn test_movie_comments_listing() {
    let (server, _) = seeded_server().await;

    server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 2, "content": POSITIVE_TEXT }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.get("/api/v1/movies/2/comments").await;
    response.assert_status_ok();
    let comments: Vec<serde_json::Value> = response.json();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["movie_id"], 2);

    let response = server.get("/api/v1/movies/404/comments").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_top_rated_requires_three_comments() {
    let (server, _) = seeded_server().await;

    // Two comments on movie 1: below the threshold.
    for user in 1..=2 {
        server
            .post("/api/v1/comments")
            .json(&json!({ "user_id": user, "movie_id": 1, "content": POSITIVE_TEXT }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let response = server.get("/api/v1/movies/top-rated").await;
    response.assert_status_ok();
    let rated: Vec<serde_json::Value> = response.json();
    assert!(rated.is_empty());

    // The third comment crosses it.
    server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 3, "movie_id": 1, "content": POSITIVE_TEXT }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let rated: Vec<serde_json::Value> = server.get("/api/v1/movies/top-rated").await.json();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0]["comment_count"], 3);
}

#[tokio::test]
async fn test_cold_start_recommendations_match_top_rated() {
    let (server, _) = seeded_server().await;

    for user in 1..=3 {
        server
            .post("/api/v1/comments")
            .json(&json!({ "user_id": user, "movie_id": 1, "content": POSITIVE_TEXT }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    // User 99 has no history: global ranking.
    let response = server.get("/api/v1/users/99/recommendations").await;
    response.assert_status_ok();
    let recs: Vec<serde_json::Value> = response.json();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["movie_id"], 1);
    assert_eq!(recs[0]["reason"], "High average rating");
}

#[tokio::test]
async fn test_personalized_recommendations_prefer_liked_genre() {
    let (server, _) = seeded_server().await;

    // User 1 loves a sci-fi movie; Blade Runner (sci-fi) should outrank
    // Heat (crime) among the unseen candidates.
    server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 1, "content": POSITIVE_TEXT }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let recs: Vec<serde_json::Value> =
        server.get("/api/v1/users/1/recommendations").await.json();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["movie_id"], 2);
    assert_eq!(recs[0]["reason"], "Matches a genre you rate highly");
    assert_eq!(recs[1]["movie_id"], 3);
}

#[tokio::test]
async fn test_dataset_save_filters_and_ownership() {
    let (server, _) = seeded_server().await;

    server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 1, "content": POSITIVE_TEXT }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let item = |movie_id: i64, title: &str| {
        json!({
            "movie_id": movie_id,
            "title": title,
            "predicted_rating": 8.0,
            "rating_text": "Excellent",
            "reason": "High average rating"
        })
    };

    // Movie 2 was never commented on by user 1: filtered out.
    let response = server
        .post("/api/v1/recommendations/datasets")
        .json(&json!({
            "user_id": 1,
            "recommendations": [item(1, "Alien"), item(2, "Blade Runner")]
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let saved: serde_json::Value = response.json();
    assert_eq!(saved["saved_count"], 1);
    assert_eq!(saved["total_received"], 2);
    assert_eq!(saved["skipped_titles"][0], "Blade Runner");
    let dataset_id = saved["dataset_id"].as_i64().unwrap();

    // Owner can read it back.
    let response = server
        .get(&format!("/api/v1/recommendations/datasets/{}", dataset_id))
        .add_query_param("user_id", 1)
        .await;
    response.assert_status_ok();

    // Strangers cannot.
    let response = server
        .get(&format!("/api/v1/recommendations/datasets/{}", dataset_id))
        .add_query_param("user_id", 2)
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    // Owner listing shows one dataset.
    let listing: serde_json::Value = server
        .get("/api/v1/users/1/recommendations/datasets")
        .await
        .json();
    assert_eq!(listing["count"], 1);

    // Delete and verify it is gone.
    server
        .delete(&format!("/api/v1/recommendations/datasets/{}", dataset_id))
        .add_query_param("user_id", 1)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server
        .get(&format!("/api/v1/recommendations/datasets/{}", dataset_id))
        .add_query_param("user_id", 1)
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dataset_save_with_no_valid_items_is_rejected() {
    let (server, _) = seeded_server().await;

    let response = server
        .post("/api/v1/recommendations/datasets")
        .json(&json!({
            "user_id": 1,
            "recommendations": [{
                "movie_id": 3,
                "title": "Heat",
                "predicted_rating": 8.0,
                "rating_text": "Excellent",
                "reason": "High average rating"
            }]
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_recompute_reports_summary() {
    let (server, store) = seeded_server().await;

    server
        .post("/api/v1/comments")
        .json(&json!({ "user_id": 1, "movie_id": 1, "content": POSITIVE_TEXT }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    // Tamper with the stored score so the sweep has something to fix.
    let mut stored = store.find_comment(1, 1).await.unwrap().unwrap();
    stored.sentiment_score = 1.0;
    stored.sentiment = cinesense_api::models::Sentiment::Negative;
    store.update_comment(&stored).await.unwrap();

    let response = server.post("/api/v1/admin/sentiments/recompute").await;
    response.assert_status_ok();
    let report: serde_json::Value = response.json();

    assert_eq!(report["total"], 1);
    assert_eq!(report["processed"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["changed_sentiment"], 1);
    assert_eq!(report["cancelled"], false);
    assert_eq!(report["sentiment_counts"]["positive"], 1);

    // Stats reflect the corrected category.
    let stats: serde_json::Value = server.get("/api/v1/admin/sentiments/stats").await.json();
    assert_eq!(stats["positive"], 1);
    assert_eq!(stats["negative"], 0);
}
