use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Comment, Movie, NewComment, RatedMovie, RecommendationDataset, RecommendationItem};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

#[cfg(test)]
use mockall::automock;

/// Narrow storage interface consumed by the scoring and recommendation
/// core.
///
/// The `(user_id, movie_id)` uniqueness for comments is the store's
/// responsibility: `insert_comment` must be a single atomic constrained
/// insert that reports a duplicate as `AppError::Conflict`, never a
/// check-then-insert in application code.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_comment(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Comment>>;

    async fn find_comment_by_id(&self, id: i64) -> AppResult<Option<Comment>>;

    /// Atomic constrained insert; duplicate (user, movie) yields Conflict
    async fn insert_comment(&self, comment: NewComment) -> AppResult<Comment>;

    async fn update_comment(&self, comment: &Comment) -> AppResult<()>;

    async fn list_comments_by_movie(&self, movie_id: i64) -> AppResult<Vec<Comment>>;

    async fn list_comments_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>>;

    async fn list_all_comments(&self) -> AppResult<Vec<Comment>>;

    async fn get_movie(&self, movie_id: i64) -> AppResult<Option<Movie>>;

    async fn list_all_movies(&self) -> AppResult<Vec<Movie>>;

    /// Movies the user has not commented on, in ascending id order
    async fn list_uncommented_movies_for(&self, user_id: i64) -> AppResult<Vec<Movie>>;

    /// Only the rating aggregator calls this
    async fn update_movie_aggregate_rating(&self, movie_id: i64, rating: f64) -> AppResult<()>;

    /// Movies ranked by mean comment score, requiring a minimum number of
    /// comments; ties broken by ascending movie id
    async fn top_rated(&self, min_comments: i64, limit: i64) -> AppResult<Vec<RatedMovie>>;

    async fn insert_dataset(
        &self,
        user_id: i64,
        items: Vec<RecommendationItem>,
    ) -> AppResult<RecommendationDataset>;

    async fn list_datasets_by_user(&self, user_id: i64) -> AppResult<Vec<RecommendationDataset>>;

    async fn find_dataset(&self, id: i64) -> AppResult<Option<RecommendationDataset>>;

    async fn delete_dataset(&self, id: i64) -> AppResult<()>;
}
