use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{error::AppResult, models::RecommendationItem};

use super::{movies::LimitQuery, AppState};

const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Personalized recommendations, cold-start ranking for new users
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<RecommendationItem>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    let items = state.recommendations.recommend(user_id, limit).await?;
    Ok(Json(items))
}
