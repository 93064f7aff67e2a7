use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{Comment, NewComment, Sentiment},
    services::{aggregator::RatingAggregator, resolver::SentimentResolver},
};

/// Per-movie sentiment read model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieSentiment {
    pub movie_id: i64,
    pub sentiment: Sentiment,
    pub score: f64,
    pub comment_count: usize,
}

/// Category tallies across the whole comment corpus
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SentimentStats {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// The only write path for comments.
///
/// Orchestrates resolve -> store -> aggregate so a stored comment always
/// carries an authoritative score and the movie aggregate stays current.
pub struct CommentService {
    store: Arc<dyn ReviewStore>,
    resolver: Arc<SentimentResolver>,
    aggregator: Arc<RatingAggregator>,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        resolver: Arc<SentimentResolver>,
        aggregator: Arc<RatingAggregator>,
    ) -> Self {
        Self {
            store,
            resolver,
            aggregator,
        }
    }

    /// Creates a scored comment.
    ///
    /// Fails only on invalid input, a missing movie, a duplicate
    /// (user, movie) pair, or a storage error; an external scoring outage
    /// is absorbed by the resolver's fallback.
    pub async fn create(&self, user_id: i64, movie_id: i64, content: &str) -> AppResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "comment content must not be empty".to_string(),
            ));
        }

        if self.store.get_movie(movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "movie {} does not exist",
                movie_id
            )));
        }

        let (sentiment, score) = self.resolver.resolve(content).await;

        let comment = self
            .store
            .insert_comment(NewComment {
                user_id,
                movie_id,
                content: content.to_string(),
                sentiment,
                sentiment_score: score,
            })
            .await?;

        self.aggregator.recompute_movie_rating(movie_id).await?;

        tracing::info!(
            comment_id = comment.id,
            user_id,
            movie_id,
            sentiment = %sentiment,
            score,
            "Comment created"
        );

        Ok(comment)
    }

    /// Rewrites a comment's content and re-resolves its sentiment
    pub async fn update(&self, comment_id: i64, content: &str) -> AppResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "comment content must not be empty".to_string(),
            ));
        }

        let mut comment = self
            .store
            .find_comment_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {} does not exist", comment_id)))?;

        let (sentiment, score) = self.resolver.resolve(content).await;
        comment.content = content.to_string();
        comment.sentiment = sentiment;
        comment.sentiment_score = score;

        self.store.update_comment(&comment).await?;
        self.aggregator.recompute_movie_rating(comment.movie_id).await?;

        Ok(comment)
    }

    pub async fn comments_for_movie(&self, movie_id: i64) -> AppResult<Vec<Comment>> {
        if self.store.get_movie(movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "movie {} does not exist",
                movie_id
            )));
        }
        self.store.list_comments_by_movie(movie_id).await
    }

    pub async fn comments_by_user(&self, user_id: i64) -> AppResult<Vec<Comment>> {
        self.store.list_comments_by_user(user_id).await
    }

    /// Mean sentiment over a movie's comments. A movie with no comments
    /// reads as (neutral, 0.0, 0) rather than a fabricated midpoint.
    pub async fn movie_sentiment(&self, movie_id: i64) -> AppResult<MovieSentiment> {
        if self.store.get_movie(movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "movie {} does not exist",
                movie_id
            )));
        }

        let comments = self.store.list_comments_by_movie(movie_id).await?;
        if comments.is_empty() {
            return Ok(MovieSentiment {
                movie_id,
                sentiment: Sentiment::Neutral,
                score: 0.0,
                comment_count: 0,
            });
        }

        let mean =
            comments.iter().map(|c| c.sentiment_score).sum::<f64>() / comments.len() as f64;

        Ok(MovieSentiment {
            movie_id,
            sentiment: Sentiment::from_score(mean),
            score: mean,
            comment_count: comments.len(),
        })
    }

    /// Corpus-wide tallies of stored categories
    pub async fn sentiment_stats(&self) -> AppResult<SentimentStats> {
        let comments = self.store.list_all_comments().await?;

        let mut stats = SentimentStats::default();
        for comment in comments {
            match comment.sentiment {
                Sentiment::Positive => stats.positive += 1,
                Sentiment::Neutral => stats.neutral += 1,
                Sentiment::Negative => stats.negative += 1,
            }
        }

        Ok(stats)
    }
}
