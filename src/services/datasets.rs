use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::ReviewStore,
    error::{AppError, AppResult},
    models::{RecommendationDataset, RecommendationItem},
};

/// Result of a snapshot save, including what was filtered out
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSaveOutcome {
    pub dataset: RecommendationDataset,
    pub saved_count: usize,
    pub total_received: usize,
    /// Titles rejected because the user never commented on the movie
    pub skipped_titles: Vec<String>,
}

/// Persists immutable recommendation snapshots per user.
///
/// Items are stored verbatim, except that items for movies the user has
/// not actually commented on are rejected — clients cannot smuggle
/// arbitrary movies into their history.
pub struct DatasetService {
    store: Arc<dyn ReviewStore>,
}

impl DatasetService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn save(
        &self,
        user_id: i64,
        items: Vec<RecommendationItem>,
    ) -> AppResult<DatasetSaveOutcome> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "no recommendations to save".to_string(),
            ));
        }

        let commented: HashSet<i64> = self
            .store
            .list_comments_by_user(user_id)
            .await?
            .into_iter()
            .map(|c| c.movie_id)
            .collect();

        let total_received = items.len();
        let mut kept = Vec::new();
        let mut skipped_titles = Vec::new();
        for item in items {
            if commented.contains(&item.movie_id) {
                kept.push(item);
            } else {
                skipped_titles.push(item.title);
            }
        }

        if kept.is_empty() {
            return Err(AppError::Validation(
                "none of the selected movies have been commented on by this user".to_string(),
            ));
        }

        let saved_count = kept.len();
        let dataset = self.store.insert_dataset(user_id, kept).await?;

        tracing::info!(
            dataset_id = dataset.id,
            user_id,
            saved = saved_count,
            skipped = skipped_titles.len(),
            "Recommendation snapshot saved"
        );

        Ok(DatasetSaveOutcome {
            dataset,
            saved_count,
            total_received,
            skipped_titles,
        })
    }

    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<RecommendationDataset>> {
        self.store.list_datasets_by_user(user_id).await
    }

    /// Fetches a dataset, visible only to its owner
    pub async fn get(&self, id: i64, user_id: i64) -> AppResult<RecommendationDataset> {
        let dataset = self
            .store
            .find_dataset(id)
            .await?
            .filter(|d| d.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("dataset {} not found", id)))?;

        Ok(dataset)
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> AppResult<()> {
        // Ownership check first; foreign datasets read as absent.
        self.get(id, user_id).await?;
        self.store.delete_dataset(id).await
    }
}
