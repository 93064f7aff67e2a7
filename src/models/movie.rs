use serde::{Deserialize, Serialize};

/// Partial movie view consumed by the scoring and recommendation core.
///
/// `aggregate_rating` is owned by the rating aggregator; nothing else
/// writes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub director: String,
    /// Mean canonical sentiment score over the movie's comments,
    /// 0.0 while the movie has no comments.
    pub aggregate_rating: f64,
}

/// A movie paired with its live comment statistics, as returned by the
/// top-rated query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatedMovie {
    pub movie: Movie,
    pub average_score: f64,
    pub comment_count: i64,
}
