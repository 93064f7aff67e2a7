use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{
        Comment, Movie, NewComment, RatedMovie, RecommendationDataset, RecommendationItem,
    },
};

/// In-memory review store.
///
/// Backs the integration tests and local runs without a database. The
/// write lock makes the duplicate check and the insert a single atomic
/// step, mirroring the unique-index semantics of the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    comments: BTreeMap<i64, Comment>,
    movies: BTreeMap<i64, Movie>,
    datasets: BTreeMap<i64, RecommendationDataset>,
    next_comment_id: i64,
    next_movie_id: i64,
    next_dataset_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a movie into the catalog, assigning the next id
    pub async fn add_movie(&self, title: &str, genre: &str, director: &str) -> Movie {
        let mut inner = self.inner.write().await;
        inner.next_movie_id += 1;
        let movie = Movie {
            id: inner.next_movie_id,
            title: title.to_string(),
            genre: genre.to_string(),
            director: director.to_string(),
            aggregate_rating: 0.0,
        };
        inner.movies.insert(movie.id, movie.clone());
        movie
    }
}

#[async_trait::async_trait]
impl ReviewStore for MemoryStore {
    async fn find_comment(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .find(|c| c.user_id == user_id && c.movie_id == movie_id)
            .cloned())
    }

    async fn find_comment_by_id(&self, id: i64) -> AppResult<Option<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let mut inner = self.inner.write().await;

        let duplicate = inner
            .comments
            .values()
            .any(|c| c.user_id == comment.user_id && c.movie_id == comment.movie_id);
        if duplicate {
            return Err(AppError::Conflict(
                "user has already commented on this movie".to_string(),
            ));
        }

        inner.next_comment_id += 1;
        let now = Utc::now();
        let stored = Comment {
            id: inner.next_comment_id,
            user_id: comment.user_id,
            movie_id: comment.movie_id,
            content: comment.content,
            sentiment: comment.sentiment,
            sentiment_score: comment.sentiment_score,
            created_at: now,
            updated_at: now,
        };
        inner.comments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_comment(&self, comment: &Comment) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        match inner.comments.get_mut(&comment.id) {
            Some(stored) => {
                stored.content = comment.content.clone();
                stored.sentiment = comment.sentiment;
                stored.sentiment_score = comment.sentiment_score;
                stored.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "comment {} does not exist",
                comment.id
            ))),
        }
    }

    async fn list_comments_by_movie(&self, movie_id: i64) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn list_comments_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_comments(&self) -> AppResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        Ok(inner.comments.values().cloned().collect())
    }

    async fn get_movie(&self, movie_id: i64) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(&movie_id).cloned())
    }

    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.values().cloned().collect())
    }

    async fn list_uncommented_movies_for(&self, user_id: i64) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        let commented: Vec<i64> = inner
            .comments
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.movie_id)
            .collect();

        Ok(inner
            .movies
            .values()
            .filter(|m| !commented.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn update_movie_aggregate_rating(&self, movie_id: i64, rating: f64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        match inner.movies.get_mut(&movie_id) {
            Some(movie) => {
                movie.aggregate_rating = rating;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "movie {} does not exist",
                movie_id
            ))),
        }
    }

    async fn top_rated(&self, min_comments: i64, limit: i64) -> AppResult<Vec<RatedMovie>> {
        let inner = self.inner.read().await;

        let mut rated: Vec<RatedMovie> = inner
            .movies
            .values()
            .filter_map(|movie| {
                let scores: Vec<f64> = inner
                    .comments
                    .values()
                    .filter(|c| c.movie_id == movie.id)
                    .map(|c| c.sentiment_score)
                    .collect();
                if (scores.len() as i64) < min_comments || scores.is_empty() {
                    return None;
                }
                Some(RatedMovie {
                    movie: movie.clone(),
                    average_score: scores.iter().sum::<f64>() / scores.len() as f64,
                    comment_count: scores.len() as i64,
                })
            })
            .collect();

        rated.sort_by(|a, b| {
            b.average_score
                .partial_cmp(&a.average_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.movie.id.cmp(&b.movie.id))
        });
        rated.truncate(limit.max(0) as usize);
        Ok(rated)
    }

    async fn insert_dataset(
        &self,
        user_id: i64,
        items: Vec<RecommendationItem>,
    ) -> AppResult<RecommendationDataset> {
        let mut inner = self.inner.write().await;
        inner.next_dataset_id += 1;
        let dataset = RecommendationDataset {
            id: inner.next_dataset_id,
            user_id,
            items,
            created_at: Utc::now(),
        };
        inner.datasets.insert(dataset.id, dataset.clone());
        Ok(dataset)
    }

    async fn list_datasets_by_user(&self, user_id: i64) -> AppResult<Vec<RecommendationDataset>> {
        let inner = self.inner.read().await;
        let mut datasets: Vec<RecommendationDataset> = inner
            .datasets
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        datasets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(datasets)
    }

    async fn find_dataset(&self, id: i64) -> AppResult<Option<RecommendationDataset>> {
        let inner = self.inner.read().await;
        Ok(inner.datasets.get(&id).cloned())
    }

    async fn delete_dataset(&self, id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.datasets.remove(&id);
        Ok(())
    }
}
