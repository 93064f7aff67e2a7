use std::sync::Arc;

use crate::{
    config::ScoringConfig,
    db::ReviewStore,
    services::{
        CommentService, DatasetService, RatingAggregator, RecommendationEngine, SentimentResolver,
    },
};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub aggregator: Arc<RatingAggregator>,
    pub recommendations: Arc<RecommendationEngine>,
    pub datasets: Arc<DatasetService>,
}

impl AppState {
    /// Wires the service graph over a storage backend and scoring config
    pub fn new(store: Arc<dyn ReviewStore>, scoring: &ScoringConfig) -> Self {
        Self::with_resolver(store, SentimentResolver::from_config(scoring))
    }

    /// State over an explicit resolver; used by tests to control the
    /// scoring path.
    pub fn with_resolver(store: Arc<dyn ReviewStore>, resolver: SentimentResolver) -> Self {
        let resolver = Arc::new(resolver);
        let aggregator = Arc::new(RatingAggregator::new(store.clone(), resolver.clone()));
        let comments = Arc::new(CommentService::new(
            store.clone(),
            resolver,
            aggregator.clone(),
        ));
        let recommendations = Arc::new(RecommendationEngine::new(store.clone()));
        let datasets = Arc::new(DatasetService::new(store));

        Self {
            comments,
            aggregator,
            recommendations,
            datasets,
        }
    }
}
