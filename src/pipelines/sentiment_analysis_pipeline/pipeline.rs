use super::model::SentimentAnalysisModel;
use crate::error::Result;
use tokenizers::Tokenizer;

/// Raw classifier output: the model's own label vocabulary and the
/// probability it assigned to that label.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
}

/// A bound, ready-to-use text classifier.
///
/// Implementations must tolerate concurrent calls from several request
/// handlers; nothing is mutated after construction.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<SentimentResult>;
}

pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Predict sentiment with structured result containing label and confidence score
    pub fn predict(&self, text: &str) -> Result<SentimentResult> {
        self.model.predict_with_score(&self.tokenizer, text)
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

impl<M> SentimentClassifier for SentimentAnalysisPipeline<M>
where
    M: SentimentAnalysisModel + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        self.predict(text)
    }
}
