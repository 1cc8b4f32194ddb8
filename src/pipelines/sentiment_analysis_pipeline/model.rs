use super::pipeline::SentimentResult;
use crate::error::Result;
use tokenizers::Tokenizer;

#[allow(async_fn_in_trait)]
pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + Clone;

    async fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Predict sentiment and return both the model's native label and its
    /// confidence score.
    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult>;

    async fn get_tokenizer(options: Self::Options) -> Result<Tokenizer>;

    fn device(&self) -> &candle_core::Device;
}
