/// Remote sentiment model provider
///
/// Wraps an HTTP endpoint that classifies text into star levels (or a
/// positive/neutral/negative distribution) with per-label probabilities.
/// The probability-weighted mean is converted from the model's native 1-5
/// scale to the canonical 1-10 scale here, at the boundary, so nothing
/// downstream ever sees the native scale.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    config::ScoringConfig,
    error::{AppError, AppResult},
    models::{SCALE_MAX, SCALE_MIN},
    services::providers::{RetryPolicy, SentimentProvider},
};

const NATIVE_MIN: f64 = 1.0;
const NATIVE_MAX: f64 = 5.0;

/// One (label, probability) pair from the model
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Decoded response shape, handled exhaustively.
///
/// The endpoint sometimes returns a flat list, sometimes a batch-wrapped
/// list, and reports transient conditions ("model loading") as an error
/// object. Everything else is an unrecognized shape.
#[derive(Debug, PartialEq)]
pub enum ProviderReply {
    Success(Vec<LabelScore>),
    ApiError(String),
    Unrecognized,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawReply {
    Error { error: String },
    Flat(Vec<LabelScore>),
    Batched(Vec<Vec<LabelScore>>),
}

/// Decodes a response body into one of the three known shapes
pub fn decode_reply(body: &str) -> ProviderReply {
    match serde_json::from_str::<RawReply>(body) {
        Ok(RawReply::Error { error }) => ProviderReply::ApiError(error),
        Ok(RawReply::Flat(items)) => ProviderReply::Success(items),
        Ok(RawReply::Batched(mut batches)) => {
            if batches.is_empty() {
                ProviderReply::Unrecognized
            } else {
                ProviderReply::Success(batches.swap_remove(0))
            }
        }
        Err(_) => ProviderReply::Unrecognized,
    }
}

/// Numeric value encoded by a classification label.
///
/// Star labels carry a digit ("4 stars", "LABEL_3"); class labels map to
/// the extremes and middle of the native scale.
fn label_value(label: &str) -> Option<f64> {
    if let Some(digit) = label.chars().find(|c| c.is_ascii_digit()) {
        let value = digit.to_digit(10).unwrap_or(0) as f64;
        return Some(value.clamp(NATIVE_MIN, NATIVE_MAX));
    }

    let upper = label.to_uppercase();
    if upper.starts_with("POS") {
        Some(NATIVE_MAX)
    } else if upper.starts_with("NEU") {
        Some((NATIVE_MIN + NATIVE_MAX) / 2.0)
    } else if upper.starts_with("NEG") {
        Some(NATIVE_MIN)
    } else {
        None
    }
}

/// Probability-weighted mean of label values on the native scale
fn weighted_native_score(items: &[LabelScore]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut mass = 0.0;

    for item in items {
        if let Some(value) = label_value(&item.label) {
            weighted += value * item.score;
            mass += item.score;
        }
    }

    if mass > 0.0 {
        Some((weighted / mass).clamp(NATIVE_MIN, NATIVE_MAX))
    } else {
        None
    }
}

fn to_canonical(native: f64) -> f64 {
    let unit = (native - NATIVE_MIN) / (NATIVE_MAX - NATIVE_MIN);
    (unit * (SCALE_MAX - SCALE_MIN) + SCALE_MIN).clamp(SCALE_MIN, SCALE_MAX)
}

/// HTTP client for the remote sentiment model
pub struct RemoteSentimentProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl RemoteSentimentProvider {
    pub fn new(config: &ScoringConfig) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AppError::HttpClient)?;

        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                base_backoff: config.base_backoff,
            },
        })
    }

    async fn attempt(&self, text: &str) -> AppResult<f64> {
        let mut request = self
            .http_client
            .post(&self.api_url)
            .json(&serde_json::json!({ "inputs": text }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "sentiment API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;

        match decode_reply(&body) {
            ProviderReply::Success(items) => {
                let native = weighted_native_score(&items).ok_or_else(|| {
                    AppError::ExternalApi("response carried no usable labels".to_string())
                })?;
                Ok(to_canonical(native))
            }
            ProviderReply::ApiError(error) => Err(AppError::ExternalApi(format!(
                "sentiment API error: {}",
                error
            ))),
            ProviderReply::Unrecognized => Err(AppError::ExternalApi(
                "unrecognized sentiment API response shape".to_string(),
            )),
        }
    }
}

#[async_trait::async_trait]
impl SentimentProvider for RemoteSentimentProvider {
    async fn score(&self, text: &str) -> AppResult<f64> {
        let attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff_for(attempt - 1)).await;
            }

            match self.attempt(text).await {
                Ok(score) => {
                    tracing::debug!(score, attempt, provider = self.name(), "Sentiment scored");
                    return Ok(score);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        provider = self.name(),
                        "Sentiment provider attempt failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(AppError::ExternalApi(format!(
            "sentiment provider gave up after {} attempts: {}",
            attempts, last_error
        )))
    }

    fn name(&self) -> &'static str {
        "remote-sentiment"
    }
}
