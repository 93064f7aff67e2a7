use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{error::AppResult, models::Comment};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub user_id: i64,
    pub movie_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Create a comment; sentiment is resolved server-side
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .comments
        .create(request.user_id, request.movie_id, &request.content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Rewrite a comment's content and re-resolve its sentiment
pub async fn update(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(request): Json<UpdateCommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = state.comments.update(comment_id, &request.content).await?;
    Ok(Json(comment))
}

/// All comments written by a user
pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state.comments.comments_by_user(user_id).await?;
    Ok(Json(comments))
}
