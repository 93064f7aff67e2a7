use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    services::{comments::SentimentStats, CancelFlag, RecomputeReport},
};

use super::AppState;

/// Re-run sentiment resolution over every stored comment.
///
/// Administrative/migration operation: always completes with a summary,
/// recording per-comment failures instead of aborting.
pub async fn recompute_sentiments(
    State(state): State<AppState>,
) -> AppResult<Json<RecomputeReport>> {
    let report = state.aggregator.recompute_all(&CancelFlag::new()).await?;
    Ok(Json(report))
}

/// Corpus-wide sentiment category tallies
pub async fn sentiment_stats(State(state): State<AppState>) -> AppResult<Json<SentimentStats>> {
    let stats = state.comments.sentiment_stats().await?;
    Ok(Json(stats))
}
