use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::ReviewStore,
    error::AppResult,
    models::{Movie, RatedMovie, RecommendationItem, Sentiment},
};

/// Bonus added when a candidate shares a genre with the user's liked set
const GENRE_BONUS: f64 = 2.0;
/// Bonus added when a candidate shares a director with the user's liked set
const DIRECTOR_BONUS: f64 = 1.0;
/// Comments required before a movie can appear in the global ranking,
/// keeping single-comment outliers out of the cold-start path
const TOP_RATED_MIN_COMMENTS: i64 = 3;

const REASON_GENRE: &str = "Matches a genre you rate highly";
const REASON_DIRECTOR: &str = "Matches a director you rate highly";
const REASON_TOP_RATED: &str = "High average rating";

/// Ranks unseen movies for a user from their comment history.
///
/// Users with no history get the global top-rated ranking instead.
pub struct RecommendationEngine {
    store: Arc<dyn ReviewStore>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Returns up to `limit` recommendations, highest-ranked first.
    ///
    /// Ordering is deterministic: ties in the computed score are broken
    /// by ascending movie id.
    pub async fn recommend(&self, user_id: i64, limit: usize) -> AppResult<Vec<RecommendationItem>> {
        let history = self.store.list_comments_by_user(user_id).await?;

        if history.is_empty() {
            tracing::debug!(user_id, "No comment history, using cold-start ranking");
            return self.cold_start(limit).await;
        }

        // Preferences come from the movies the user scored in the
        // positive band.
        let liked_ids: HashSet<i64> = history
            .iter()
            .filter(|c| Sentiment::from_score(c.sentiment_score) == Sentiment::Positive)
            .map(|c| c.movie_id)
            .collect();

        let movies_by_id: HashMap<i64, Movie> = self
            .store
            .list_all_movies()
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut liked_genres: HashMap<String, usize> = HashMap::new();
        let mut liked_directors: HashMap<String, usize> = HashMap::new();
        for movie_id in &liked_ids {
            if let Some(movie) = movies_by_id.get(movie_id) {
                *liked_genres.entry(movie.genre.clone()).or_default() += 1;
                *liked_directors.entry(movie.director.clone()).or_default() += 1;
            }
        }

        let candidates = self.store.list_uncommented_movies_for(user_id).await?;

        let mut scored: Vec<(Movie, f64, &'static str)> = candidates
            .into_iter()
            .map(|movie| {
                let mut score = movie.aggregate_rating;
                let mut reason = REASON_TOP_RATED;

                if liked_genres.contains_key(&movie.genre) {
                    score += GENRE_BONUS;
                    reason = REASON_GENRE;
                }
                if liked_directors.contains_key(&movie.director) {
                    score += DIRECTOR_BONUS;
                    if reason == REASON_TOP_RATED {
                        reason = REASON_DIRECTOR;
                    }
                }

                (movie, score, reason)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.id.cmp(&b.0.id))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(movie, score, reason)| RecommendationItem {
                movie_id: movie.id,
                title: movie.title,
                predicted_rating: round1(score),
                rating_text: rating_text(score).to_string(),
                reason: reason.to_string(),
            })
            .collect())
    }

    /// Global top-rated ranking used when no personal signal exists
    async fn cold_start(&self, limit: usize) -> AppResult<Vec<RecommendationItem>> {
        let top = self
            .store
            .top_rated(TOP_RATED_MIN_COMMENTS, limit as i64)
            .await?;

        Ok(top
            .into_iter()
            .map(|rated| RecommendationItem {
                movie_id: rated.movie.id,
                title: rated.movie.title,
                predicted_rating: round1(rated.average_score),
                rating_text: rating_text(rated.average_score).to_string(),
                reason: REASON_TOP_RATED.to_string(),
            })
            .collect())
    }

    /// Public top-rated listing (same query the cold-start path uses)
    pub async fn top_rated(&self, limit: usize) -> AppResult<Vec<RatedMovie>> {
        self.store
            .top_rated(TOP_RATED_MIN_COMMENTS, limit as i64)
            .await
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Human-readable label for a predicted rating
pub fn rating_text(score: f64) -> &'static str {
    if score >= 9.5 {
        "Masterpiece"
    } else if score >= 9.0 {
        "Exceptional"
    } else if score >= 8.0 {
        "Excellent"
    } else if score >= 7.0 {
        "Very good"
    } else if score >= 6.0 {
        "Good"
    } else if score >= 5.0 {
        "Decent"
    } else if score >= 4.0 {
        "Average"
    } else if score >= 3.0 {
        "Poor"
    } else if score >= 2.0 {
        "Very poor"
    } else {
        "Terrible"
    }
}
