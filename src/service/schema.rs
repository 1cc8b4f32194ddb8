use crate::labels::SentimentLabel;
use serde::{Deserialize, Serialize};

/// Request body for `POST /analyze-sentiment/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SentimentRequest {
    pub text: String,
}

/// Response body for `POST /analyze-sentiment/`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SentimentResponse {
    pub label: SentimentLabel,
    pub score: f32,
}

impl SentimentResponse {
    /// The payload returned whenever no prediction could be made.
    pub fn fallback() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

/// Body of the health check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub message: String,
}

pub const HEALTH_MESSAGE: &str = "Sentiment Analysis API is running.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_serializes_to_neutral_zero() {
        let json = serde_json::to_value(SentimentResponse::fallback()).unwrap();
        assert_eq!(json, serde_json::json!({"label": "NEUTRAL", "score": 0.0}));
    }

    #[test]
    fn request_ignores_unknown_fields() {
        let req: SentimentRequest =
            serde_json::from_str(r#"{"text": "hello", "lang": "en"}"#).unwrap();
        assert_eq!(req.text, "hello");
    }
}
