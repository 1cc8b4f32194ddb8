//! Analysis Service: turns request text into a [`SentimentResponse`].
//!
//! The classifier is injected once at construction and never replaced. Every
//! call produces an explicit [`AnalysisOutcome`]; the HTTP layer collapses the
//! two failure variants into [`SentimentResponse::fallback`].

pub mod routes;
pub mod schema;

pub use routes::{
    app, build_router, cors_layer, parse_request, InvalidRequest, DEFAULT_ALLOWED_ORIGINS,
};
pub use schema::{HealthResponse, SentimentRequest, SentimentResponse, HEALTH_MESSAGE};

use crate::labels::SentimentLabel;
use crate::pipelines::SentimentClassifier;
use std::sync::Arc;

/// Result of one analysis request at the inference boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The classifier ran and its label was remapped.
    Classified(SentimentResponse),
    /// No classifier was loaded at startup.
    Unavailable,
    /// The classifier returned an error, a non-finite score, or panicked.
    Failed(String),
}

impl AnalysisOutcome {
    /// Collapses the outcome into the payload sent to the caller, logging the
    /// failure variants.
    pub fn into_response(self) -> SentimentResponse {
        match self {
            AnalysisOutcome::Classified(response) => response,
            AnalysisOutcome::Unavailable => {
                tracing::error!("Sentiment pipeline not loaded.");
                SentimentResponse::fallback()
            }
            AnalysisOutcome::Failed(reason) => {
                tracing::error!(error = %reason, "Error during sentiment analysis");
                SentimentResponse::fallback()
            }
        }
    }
}

#[derive(Clone)]
pub struct SentimentService {
    classifier: Option<Arc<dyn SentimentClassifier>>,
}

impl SentimentService {
    pub fn new(classifier: Option<Arc<dyn SentimentClassifier>>) -> Self {
        Self { classifier }
    }

    /// A service whose model failed to load.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classifies `text` on the blocking pool and remaps the model label.
    pub async fn analyze(&self, text: String) -> AnalysisOutcome {
        let Some(classifier) = self.classifier.clone() else {
            return AnalysisOutcome::Unavailable;
        };

        match tokio::task::spawn_blocking(move || classifier.classify(&text)).await {
            Ok(Ok(raw)) if !raw.score.is_finite() => AnalysisOutcome::Failed(format!(
                "classifier returned a non-finite score for label {:?}",
                raw.label
            )),
            Ok(Ok(raw)) => {
                let label = SentimentLabel::from_model_label(&raw.label);
                tracing::debug!(raw_label = %raw.label, %label, score = raw.score, "classified");
                AnalysisOutcome::Classified(SentimentResponse {
                    label,
                    score: raw.score,
                })
            }
            Ok(Err(e)) => AnalysisOutcome::Failed(e.to_string()),
            Err(e) => AnalysisOutcome::Failed(format!("inference task did not complete: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SentimentError};
    use crate::pipelines::SentimentResult;

    struct Fixed(&'static str, f32);

    impl SentimentClassifier for Fixed {
        fn classify(&self, _text: &str) -> Result<SentimentResult> {
            Ok(SentimentResult {
                label: self.0.to_string(),
                score: self.1,
            })
        }
    }

    struct Broken;

    impl SentimentClassifier for Broken {
        fn classify(&self, _text: &str) -> Result<SentimentResult> {
            Err(SentimentError::Tokenization("bad input".to_string()))
        }
    }

    struct Panics;

    impl SentimentClassifier for Panics {
        fn classify(&self, _text: &str) -> Result<SentimentResult> {
            panic!("inference exploded")
        }
    }

    fn service(classifier: impl SentimentClassifier + 'static) -> SentimentService {
        SentimentService::new(Some(Arc::new(classifier)))
    }

    #[tokio::test]
    async fn missing_classifier_is_unavailable() {
        let outcome = SentimentService::unavailable().analyze("hi".into()).await;
        assert_eq!(outcome, AnalysisOutcome::Unavailable);
        assert_eq!(outcome.into_response(), SentimentResponse::fallback());
    }

    #[tokio::test]
    async fn label_is_remapped_and_score_passed_through() {
        let outcome = service(Fixed("LABEL_0", 0.64)).analyze("meh".into()).await;
        assert_eq!(
            outcome,
            AnalysisOutcome::Classified(SentimentResponse {
                label: SentimentLabel::Negative,
                score: 0.64,
            })
        );
    }

    #[tokio::test]
    async fn unknown_label_keeps_score() {
        let response = service(Fixed("UNKNOWN_TAG", 0.3))
            .analyze("?".into())
            .await
            .into_response();
        assert_eq!(response.label, SentimentLabel::Neutral);
        assert_eq!(response.score, 0.3);
    }

    #[tokio::test]
    async fn classifier_error_becomes_failed() {
        let outcome = service(Broken).analyze("x".into()).await;
        match &outcome {
            AnalysisOutcome::Failed(reason) => assert!(reason.contains("bad input")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(outcome.into_response(), SentimentResponse::fallback());
    }

    #[tokio::test]
    async fn non_finite_score_becomes_failed() {
        for score in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let outcome = service(Fixed("positive", score)).analyze("x".into()).await;
            assert!(matches!(outcome, AnalysisOutcome::Failed(_)), "{score}");
            assert_eq!(outcome.into_response(), SentimentResponse::fallback());
        }
    }

    #[tokio::test]
    async fn classifier_panic_becomes_failed_and_service_survives() {
        let service = service(Panics);
        assert!(matches!(
            service.analyze("x".into()).await,
            AnalysisOutcome::Failed(_)
        ));
        assert!(matches!(
            service.analyze("again".into()).await,
            AnalysisOutcome::Failed(_)
        ));
    }
}
