use std::sync::Arc;

use crate::{
    config::ScoringConfig,
    models::Sentiment,
    services::{
        lexicon::LexiconScorer,
        normalizer::normalize,
        providers::{RemoteSentimentProvider, SentimentProvider},
    },
};

/// Orchestrates provider selection and fallback for sentiment scoring.
///
/// Tries the external provider first when one is configured, and falls
/// back to the lexicon scorer on any provider error. `resolve` therefore
/// never fails: comment writes are never blocked by an external outage.
/// All callers go through here; nothing else talks to the scorers
/// directly.
pub struct SentimentResolver {
    provider: Option<Arc<dyn SentimentProvider>>,
    lexicon: LexiconScorer,
}

impl SentimentResolver {
    /// Builds a resolver from explicit scoring configuration
    pub fn from_config(config: &ScoringConfig) -> Self {
        let provider: Option<Arc<dyn SentimentProvider>> = if config.provider_enabled {
            match RemoteSentimentProvider::new(config) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to build sentiment provider, scoring with lexicon only"
                    );
                    None
                }
            }
        } else {
            None
        };

        Self {
            provider,
            lexicon: LexiconScorer::new(),
        }
    }

    /// Resolver with no external provider; every text is scored by the
    /// lexicon heuristic.
    pub fn lexicon_only() -> Self {
        Self {
            provider: None,
            lexicon: LexiconScorer::new(),
        }
    }

    /// Resolver over a specific provider implementation
    pub fn with_provider(provider: Arc<dyn SentimentProvider>) -> Self {
        Self {
            provider: Some(provider),
            lexicon: LexiconScorer::new(),
        }
    }

    /// Produces the authoritative (category, canonical score) for a text
    pub async fn resolve(&self, text: &str) -> (Sentiment, f64) {
        if let Some(provider) = &self.provider {
            match provider.score(text).await {
                Ok(score) => {
                    let score = (score * 10.0).round() / 10.0;
                    return (Sentiment::from_score(score), score);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Sentiment provider unavailable, falling back to lexicon"
                    );
                }
            }
        }

        self.lexicon.score(&normalize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::{SCALE_MAX, SCALE_MIN};

    struct FixedProvider(f64);

    #[async_trait::async_trait]
    impl SentimentProvider for FixedProvider {
        async fn score(&self, _text: &str) -> AppResult<f64> {
            Ok(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl SentimentProvider for FailingProvider {
        async fn score(&self, _text: &str) -> AppResult<f64> {
            Err(AppError::ExternalApi("model loading".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_provider_result_wins_when_available() {
        let resolver = SentimentResolver::with_provider(Arc::new(FixedProvider(8.3)));
        let (sentiment, score) = resolver.resolve("da igual el texto").await;
        assert_eq!(sentiment, Sentiment::Positive);
        assert_eq!(score, 8.3);
    }

    #[tokio::test]
    async fn test_fallback_matches_lexicon_when_provider_fails() {
        let text = "Esta película es excelente, la recomiendo totalmente";
        let failing = SentimentResolver::with_provider(Arc::new(FailingProvider));
        let lexicon = SentimentResolver::lexicon_only();

        let resolved = failing.resolve(text).await;
        let expected = lexicon.resolve(text).await;

        assert_eq!(resolved, expected);
        assert_eq!(resolved.0, Sentiment::Positive);
    }

    #[tokio::test]
    async fn test_resolve_never_fails_even_on_empty_text() {
        let resolver = SentimentResolver::with_provider(Arc::new(FailingProvider));
        let (sentiment, score) = resolver.resolve("").await;
        assert_eq!(sentiment, Sentiment::Neutral);
        assert!((SCALE_MIN..=SCALE_MAX).contains(&score));
    }

    #[tokio::test]
    async fn test_disabled_provider_uses_lexicon() {
        let config = crate::config::ScoringConfig {
            provider_enabled: false,
            api_url: String::new(),
            api_key: None,
            timeout: std::time::Duration::from_secs(1),
            max_attempts: 3,
            base_backoff: std::time::Duration::from_millis(1),
        };
        let resolver = SentimentResolver::from_config(&config);
        let (sentiment, _) = resolver.resolve("Pésima, un desastre total").await;
        assert_eq!(sentiment, Sentiment::Negative);
    }
}
