use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{RecommendationDataset, RecommendationItem},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveDatasetRequest {
    pub user_id: i64,
    pub recommendations: Vec<RecommendationItem>,
}

#[derive(Debug, Serialize)]
pub struct SaveDatasetResponse {
    pub dataset_id: i64,
    pub saved_count: usize,
    pub total_received: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_titles: Vec<String>,
}

/// Identifies the requesting user while authentication stays out of scope
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<RecommendationDataset>,
    pub count: usize,
}

/// Snapshot a set of recommendations for a user.
///
/// Items for movies the user has never commented on are filtered out and
/// reported back; a snapshot with nothing left is rejected.
pub async fn save(
    State(state): State<AppState>,
    Json(request): Json<SaveDatasetRequest>,
) -> AppResult<(StatusCode, Json<SaveDatasetResponse>)> {
    let outcome = state
        .datasets
        .save(request.user_id, request.recommendations)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveDatasetResponse {
            dataset_id: outcome.dataset.id,
            saved_count: outcome.saved_count,
            total_received: outcome.total_received,
            skipped_titles: outcome.skipped_titles,
        }),
    ))
}

/// All snapshots owned by a user, newest first
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<DatasetListResponse>> {
    let datasets = state.datasets.list_for_user(user_id).await?;
    let count = datasets.len();
    Ok(Json(DatasetListResponse { datasets, count }))
}

/// One snapshot, visible only to its owner
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
) -> AppResult<Json<RecommendationDataset>> {
    let dataset = state.datasets.get(id, owner.user_id).await?;
    Ok(Json(dataset))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
) -> AppResult<StatusCode> {
    state.datasets.delete(id, owner.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
