use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{
        Comment, Movie, NewComment, RatedMovie, RecommendationDataset, RecommendationItem,
        Sentiment,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// PostgreSQL-backed review store.
///
/// The comments table carries a unique index on (user_id, movie_id);
/// duplicate inserts surface as SQLSTATE 23505 and are reported as
/// Conflict.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMMENT_COLUMNS: &str =
    "id, user_id, movie_id, content, sentiment, sentiment_score, created_at, updated_at";
const MOVIE_COLUMNS: &str = "id, title, genre, director, aggregate_rating";

fn comment_from_row(row: &PgRow) -> AppResult<Comment> {
    let sentiment: String = row.try_get("sentiment")?;
    let sentiment = sentiment
        .parse::<Sentiment>()
        .map_err(AppError::Internal)?;

    Ok(Comment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        movie_id: row.try_get("movie_id")?,
        content: row.try_get("content")?,
        sentiment,
        sentiment_score: row.try_get("sentiment_score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn movie_from_row(row: &PgRow) -> AppResult<Movie> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        director: row.try_get("director")?,
        aggregate_rating: row.try_get("aggregate_rating")?,
    })
}

fn dataset_from_row(row: &PgRow) -> AppResult<RecommendationDataset> {
    let items: serde_json::Value = row.try_get("items")?;
    let items: Vec<RecommendationItem> = serde_json::from_value(items)
        .map_err(|e| AppError::Internal(format!("dataset deserialization error: {}", e)))?;

    Ok(RecommendationDataset {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl ReviewStore for PgStore {
    async fn find_comment(&self, user_id: i64, movie_id: i64) -> AppResult<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE user_id = $1 AND movie_id = $2",
            COMMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(comment_from_row).transpose()
    }

    async fn find_comment_by_id(&self, id: i64) -> AppResult<Option<Comment>> {
        let sql = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(comment_from_row).transpose()
    }

    async fn insert_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let sql = format!(
            "INSERT INTO comments (user_id, movie_id, content, sentiment, sentiment_score) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COMMENT_COLUMNS
        );

        let result = sqlx::query(&sql)
            .bind(comment.user_id)
            .bind(comment.movie_id)
            .bind(&comment.content)
            .bind(comment.sentiment.as_str())
            .bind(comment.sentiment_score)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => comment_from_row(&row),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    Err(AppError::Conflict(
                        "user has already commented on this movie".to_string(),
                    ))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn update_comment(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            "UPDATE comments SET content = $1, sentiment = $2, sentiment_score = $3, \
             updated_at = now() WHERE id = $4",
        )
        .bind(&comment.content)
        .bind(comment.sentiment.as_str())
        .bind(comment.sentiment_score)
        .bind(comment.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_comments_by_movie(&self, movie_id: i64) -> AppResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE movie_id = $1 ORDER BY id",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(movie_id).fetch_all(&self.pool).await?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn list_comments_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE user_id = $1 ORDER BY id",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn list_all_comments(&self) -> AppResult<Vec<Comment>> {
        let sql = format!("SELECT {} FROM comments ORDER BY id", COMMENT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn get_movie(&self, movie_id: i64) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM movies WHERE id = $1", MOVIE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(movie_from_row).transpose()
    }

    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        let sql = format!("SELECT {} FROM movies ORDER BY id", MOVIE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(movie_from_row).collect()
    }

    async fn list_uncommented_movies_for(&self, user_id: i64) -> AppResult<Vec<Movie>> {
        let rows = sqlx::query(
            "SELECT m.id, m.title, m.genre, m.director, m.aggregate_rating \
             FROM movies m WHERE NOT EXISTS \
             (SELECT 1 FROM comments c WHERE c.movie_id = m.id AND c.user_id = $1) \
             ORDER BY m.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(movie_from_row).collect()
    }

    async fn update_movie_aggregate_rating(&self, movie_id: i64, rating: f64) -> AppResult<()> {
        sqlx::query("UPDATE movies SET aggregate_rating = $1 WHERE id = $2")
            .bind(rating)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn top_rated(&self, min_comments: i64, limit: i64) -> AppResult<Vec<RatedMovie>> {
        let rows = sqlx::query(
            "SELECT m.id, m.title, m.genre, m.director, m.aggregate_rating, \
                    AVG(c.sentiment_score) AS average_score, \
                    COUNT(c.id) AS comment_count \
             FROM movies m \
             JOIN comments c ON c.movie_id = m.id \
             GROUP BY m.id \
             HAVING COUNT(c.id) >= $1 \
             ORDER BY average_score DESC, m.id ASC \
             LIMIT $2",
        )
        .bind(min_comments)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RatedMovie {
                    movie: movie_from_row(row)?,
                    average_score: row.try_get("average_score")?,
                    comment_count: row.try_get("comment_count")?,
                })
            })
            .collect()
    }

    async fn insert_dataset(
        &self,
        user_id: i64,
        items: Vec<RecommendationItem>,
    ) -> AppResult<RecommendationDataset> {
        let payload = serde_json::to_value(&items)
            .map_err(|e| AppError::Internal(format!("dataset serialization error: {}", e)))?;

        let row = sqlx::query(
            "INSERT INTO recommendation_datasets (user_id, items) VALUES ($1, $2) \
             RETURNING id, user_id, items, created_at",
        )
        .bind(user_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        dataset_from_row(&row)
    }

    async fn list_datasets_by_user(&self, user_id: i64) -> AppResult<Vec<RecommendationDataset>> {
        let rows = sqlx::query(
            "SELECT id, user_id, items, created_at FROM recommendation_datasets \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(dataset_from_row).collect()
    }

    async fn find_dataset(&self, id: i64) -> AppResult<Option<RecommendationDataset>> {
        let row = sqlx::query(
            "SELECT id, user_id, items, created_at FROM recommendation_datasets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(dataset_from_row).transpose()
    }

    async fn delete_dataset(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendation_datasets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
