use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical sentiment scale bounds. Every scorer reports into this range.
pub const SCALE_MIN: f64 = 1.0;
pub const SCALE_MAX: f64 = 10.0;
/// Midpoint of the canonical scale, used for empty input and dampening.
pub const SCALE_MIDPOINT: f64 = 5.5;

const POSITIVE_THRESHOLD: f64 = 7.0;
const NEGATIVE_THRESHOLD: f64 = 4.0;

/// Sentiment category derived from a canonical score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Derives the category from a canonical 1-10 score.
    ///
    /// This is the single source of truth for category thresholds; every
    /// component (lexicon scorer, resolver, aggregates, recommendations)
    /// goes through here rather than re-implementing the cutoffs.
    pub fn from_score(score: f64) -> Self {
        if score >= POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment '{}'", other)),
        }
    }
}

/// A stored movie review comment with its resolved sentiment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub content: String,
    pub sentiment: Sentiment,
    /// Canonical 1-10 score as resolved at write time
    pub sentiment_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment fields known before insertion assigns an id and timestamps
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: i64,
    pub movie_id: i64,
    pub content: String,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_score_positive_at_threshold() {
        assert_eq!(Sentiment::from_score(7.0), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(10.0), Sentiment::Positive);
    }

    #[test]
    fn test_from_score_negative_at_threshold() {
        assert_eq!(Sentiment::from_score(4.0), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(1.0), Sentiment::Negative);
    }

    #[test]
    fn test_from_score_neutral_between() {
        assert_eq!(Sentiment::from_score(4.1), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(SCALE_MIDPOINT), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(6.9), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_serialization() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }

    #[test]
    fn test_sentiment_round_trip() {
        let parsed: Sentiment = "neutral".parse().unwrap();
        assert_eq!(parsed, Sentiment::Neutral);
        assert!("great".parse::<Sentiment>().is_err());
    }
}
