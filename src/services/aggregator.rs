use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::ReviewStore,
    error::AppResult,
    models::Sentiment,
    services::resolver::SentimentResolver,
};

/// Aggregate value written for a movie with no comments
const UNRATED: f64 = 0.0;

const CHANGE_SAMPLE_LIMIT: usize = 50;

/// Cooperative cancellation signal for the batch recompute.
///
/// Cancelling stops new items from starting; results already written and
/// the accumulated report are preserved.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One re-scored comment whose stored values changed
#[derive(Debug, Clone, Serialize)]
pub struct SentimentChange {
    pub comment_id: i64,
    pub old_sentiment: Sentiment,
    pub new_sentiment: Sentiment,
    pub old_score: f64,
    pub new_score: f64,
}

/// Category tallies over the re-scored corpus
#[derive(Debug, Clone, Default, Serialize)]
pub struct SentimentTally {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentTally {
    fn bump(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }
}

/// Summary of a full-corpus sentiment recompute.
///
/// The sweep never aborts on a per-item failure; failures are listed here
/// instead.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeReport {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub changed_sentiment: usize,
    pub changed_score: usize,
    pub cancelled: bool,
    pub sentiment_counts: SentimentTally,
    /// Nine buckets of width one across the canonical scale
    pub score_ranges: BTreeMap<String, usize>,
    pub failed_ids: Vec<i64>,
    /// Capped sample of individual changes
    pub changes: Vec<SentimentChange>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

fn empty_score_ranges() -> BTreeMap<String, usize> {
    let mut ranges = BTreeMap::new();
    for low in 1..=9u32 {
        ranges.insert(format!("{}-{}", low, low + 1), 0);
    }
    ranges
}

fn score_range(score: f64) -> String {
    let low = (score.floor() as i64).clamp(1, 9);
    format!("{}-{}", low, low + 1)
}

/// Recomputes movie aggregate ratings from stored comment scores.
///
/// Owns the `aggregate_rating` column: no other component writes it.
pub struct RatingAggregator {
    store: Arc<dyn ReviewStore>,
    resolver: Arc<SentimentResolver>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn ReviewStore>, resolver: Arc<SentimentResolver>) -> Self {
        Self { store, resolver }
    }

    /// Recomputes one movie's aggregate as the arithmetic mean of its
    /// comments' scores and persists it. A movie with no comments is
    /// written as unrated (0.0).
    pub async fn recompute_movie_rating(&self, movie_id: i64) -> AppResult<f64> {
        let comments = self.store.list_comments_by_movie(movie_id).await?;

        let rating = if comments.is_empty() {
            UNRATED
        } else {
            comments.iter().map(|c| c.sentiment_score).sum::<f64>() / comments.len() as f64
        };

        self.store
            .update_movie_aggregate_rating(movie_id, rating)
            .await?;

        tracing::debug!(movie_id, rating, comments = comments.len(), "Aggregate recomputed");

        Ok(rating)
    }

    /// Re-runs sentiment resolution over every stored comment and writes
    /// back changed scores, then refreshes every movie aggregate.
    ///
    /// Per-comment storage failures are recorded in the report and
    /// skipped; the sweep always completes with a summary. The cancel
    /// flag stops new items from starting.
    pub async fn recompute_all(&self, cancel: &CancelFlag) -> AppResult<RecomputeReport> {
        let started = Instant::now();
        let started_at = Utc::now();

        let comments = self.store.list_all_comments().await?;

        let mut report = RecomputeReport {
            total: comments.len(),
            processed: 0,
            failed: 0,
            changed_sentiment: 0,
            changed_score: 0,
            cancelled: false,
            sentiment_counts: SentimentTally::default(),
            score_ranges: empty_score_ranges(),
            failed_ids: Vec::new(),
            changes: Vec::new(),
            started_at,
            finished_at: started_at,
            duration_ms: 0,
        };

        for mut comment in comments {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.processed += 1;

            let (new_sentiment, new_score) = self.resolver.resolve(&comment.content).await;

            let sentiment_changed = comment.sentiment != new_sentiment;
            let score_changed = comment.sentiment_score != new_score;

            if sentiment_changed {
                report.changed_sentiment += 1;
            }
            if score_changed {
                report.changed_score += 1;
            }

            if (sentiment_changed || score_changed) && report.changes.len() < CHANGE_SAMPLE_LIMIT {
                report.changes.push(SentimentChange {
                    comment_id: comment.id,
                    old_sentiment: comment.sentiment,
                    new_sentiment,
                    old_score: comment.sentiment_score,
                    new_score,
                });
            }

            report.sentiment_counts.bump(new_sentiment);
            *report.score_ranges.entry(score_range(new_score)).or_default() += 1;

            if sentiment_changed || score_changed {
                comment.sentiment = new_sentiment;
                comment.sentiment_score = new_score;

                if let Err(e) = self.store.update_comment(&comment).await {
                    tracing::error!(comment_id = comment.id, error = %e, "Failed to save re-scored comment");
                    report.failed += 1;
                    report.failed_ids.push(comment.id);
                }
            }
        }

        // Keep aggregates consistent with whatever was written, including
        // partial sweeps.
        match self.store.list_all_movies().await {
            Ok(movies) => {
                for movie in movies {
                    if let Err(e) = self.recompute_movie_rating(movie.id).await {
                        tracing::error!(movie_id = movie.id, error = %e, "Failed to refresh aggregate");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to list movies for aggregate refresh");
            }
        }

        report.finished_at = Utc::now();
        report.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            total = report.total,
            processed = report.processed,
            failed = report.failed,
            changed_sentiment = report.changed_sentiment,
            changed_score = report.changed_score,
            cancelled = report.cancelled,
            "Sentiment recompute finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockReviewStore, ReviewStore};
    use crate::error::AppError;
    use crate::models::{Comment, NewComment};

    fn comment_with_score(user_id: i64, movie_id: i64, content: &str, score: f64) -> NewComment {
        NewComment {
            user_id,
            movie_id,
            content: content.to_string(),
            sentiment: Sentiment::from_score(score),
            sentiment_score: score,
        }
    }

    async fn seeded_store() -> (Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let movie = store.add_movie("Alien", "sci-fi", "Ridley Scott").await;
        store
            .insert_comment(comment_with_score(1, movie.id, "a", 8.0))
            .await
            .unwrap();
        store
            .insert_comment(comment_with_score(2, movie.id, "b", 6.0))
            .await
            .unwrap();
        store
            .insert_comment(comment_with_score(3, movie.id, "c", 4.0))
            .await
            .unwrap();
        (store, movie.id)
    }

    fn aggregator(store: Arc<MemoryStore>) -> RatingAggregator {
        RatingAggregator::new(store, Arc::new(SentimentResolver::lexicon_only()))
    }

    #[tokio::test]
    async fn test_aggregate_is_exact_mean() {
        let (store, movie_id) = seeded_store().await;
        let rating = aggregator(store.clone()).recompute_movie_rating(movie_id).await.unwrap();
        assert_eq!(rating, 6.0);
        assert_eq!(store.get_movie(movie_id).await.unwrap().unwrap().aggregate_rating, 6.0);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (store, movie_id) = seeded_store().await;
        let agg = aggregator(store);
        let first = agg.recompute_movie_rating(movie_id).await.unwrap();
        let second = agg.recompute_movie_rating(movie_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_zero_comments_is_unrated() {
        let store = Arc::new(MemoryStore::new());
        let movie = store.add_movie("Heat", "crime", "Michael Mann").await;
        let rating = aggregator(store).recompute_movie_rating(movie.id).await.unwrap();
        assert_eq!(rating, UNRATED);
    }

    #[tokio::test]
    async fn test_recompute_all_rewrites_stale_scores() {
        let store = Arc::new(MemoryStore::new());
        let movie = store.add_movie("Alien", "sci-fi", "Ridley Scott").await;
        // Stored with a score the lexicon would never produce for this text.
        store
            .insert_comment(comment_with_score(
                1,
                movie.id,
                "Pésima, un desastre total, no la recomiendo",
                9.9,
            ))
            .await
            .unwrap();

        let report = aggregator(store.clone())
            .recompute_all(&CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.changed_sentiment, 1);
        assert_eq!(report.changed_score, 1);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.sentiment_counts.negative, 1);
        assert!(!report.cancelled);

        let rewritten = store.find_comment(1, movie.id).await.unwrap().unwrap();
        assert_eq!(rewritten.sentiment, Sentiment::Negative);
        assert!(rewritten.sentiment_score <= 4.0);

        // Aggregates were refreshed to match the rewritten score.
        let refreshed = store.get_movie(movie.id).await.unwrap().unwrap();
        assert_eq!(refreshed.aggregate_rating, rewritten.sentiment_score);
    }

    #[tokio::test]
    async fn test_recompute_all_histogram_covers_processed() {
        let (store, _) = seeded_store().await;
        let report = aggregator(store)
            .recompute_all(&CancelFlag::new())
            .await
            .unwrap();
        let bucketed: usize = report.score_ranges.values().sum();
        assert_eq!(bucketed, report.processed);
    }

    #[tokio::test]
    async fn test_cancelled_sweep_reports_and_stops() {
        let (store, _) = seeded_store().await;
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = aggregator(store).recompute_all(&cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.processed, 0);
        assert_eq!(report.total, 3);
    }

    #[tokio::test]
    async fn test_write_failures_are_recorded_not_fatal() {
        let mut mock = MockReviewStore::new();

        let stale = |id: i64| Comment {
            id,
            user_id: id,
            movie_id: 1,
            content: "Pésima, un desastre total, no la recomiendo".to_string(),
            sentiment: Sentiment::Positive,
            sentiment_score: 9.9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        mock.expect_list_all_comments()
            .returning(move || Ok(vec![stale(1), stale(2)]));
        mock.expect_update_comment().returning(|comment| {
            if comment.id == 1 {
                Err(AppError::Internal("disk full".to_string()))
            } else {
                Ok(())
            }
        });
        mock.expect_list_all_movies().returning(|| Ok(vec![]));

        let agg = RatingAggregator::new(
            Arc::new(mock),
            Arc::new(SentimentResolver::lexicon_only()),
        );
        let report = agg.recompute_all(&CancelFlag::new()).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_ids, vec![1]);
        assert_eq!(report.changed_sentiment, 2);
    }

    #[test]
    fn test_score_range_buckets() {
        assert_eq!(score_range(1.0), "1-2");
        assert_eq!(score_range(1.9), "1-2");
        assert_eq!(score_range(5.5), "5-6");
        assert_eq!(score_range(9.0), "9-10");
        assert_eq!(score_range(10.0), "9-10");
    }
}
