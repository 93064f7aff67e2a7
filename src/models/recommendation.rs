use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ranked recommendation as returned to the client.
///
/// Ephemeral unless the caller snapshots it into a dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    pub movie_id: i64,
    pub title: String,
    pub predicted_rating: f64,
    pub rating_text: String,
    pub reason: String,
}

/// An immutable snapshot of recommendations saved by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationDataset {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<RecommendationItem>,
    pub created_at: DateTime<Utc>,
}
