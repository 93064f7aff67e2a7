use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{Comment, RatedMovie, Sentiment},
    services::recommendations::rating_text,
};

use super::AppState;

const DEFAULT_TOP_RATED_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MovieSentimentResponse {
    pub movie_id: i64,
    pub sentiment: Sentiment,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_text: Option<String>,
    pub comment_count: usize,
}

/// All comments for a movie
pub async fn comments(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state.comments.comments_for_movie(movie_id).await?;
    Ok(Json(comments))
}

/// Mean sentiment over a movie's comments
pub async fn sentiment(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MovieSentimentResponse>> {
    let sentiment = state.comments.movie_sentiment(movie_id).await?;

    let rating_text = (sentiment.comment_count > 0)
        .then(|| rating_text(sentiment.score).to_string());

    Ok(Json(MovieSentimentResponse {
        movie_id: sentiment.movie_id,
        sentiment: sentiment.sentiment,
        rating: sentiment.score,
        rating_text,
        comment_count: sentiment.comment_count,
    }))
}

/// Movies ranked by mean comment score (minimum comment count applies)
pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<RatedMovie>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_RATED_LIMIT);
    let rated = state.recommendations.top_rated(limit).await?;
    Ok(Json(rated))
}
