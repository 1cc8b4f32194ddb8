use crate::error::{Result, SentimentError};
use crate::loaders::{ConfigLoader, ModelSource, TokenizerLoader, WeightsLoader};
use crate::models::roberta::{Config, RobertaForSequenceClassification};
use crate::pipelines::sentiment_analysis_pipeline::{SentimentAnalysisModel, SentimentResult};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::softmax, VarBuilder};
use std::collections::HashMap;
use tokenizers::Tokenizer;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

/// Sentiment analysis model using a RoBERTa sequence classifier.
#[derive(Clone)]
pub struct SentimentRobertaModel {
    model: RobertaForSequenceClassification,
    device: Device,
    id2label: HashMap<String, String>,
    max_input_len: usize,
}

impl SentimentRobertaModel {
    pub async fn new(source: ModelSource, device: Device) -> Result<Self> {
        let config_content = ConfigLoader::new(&source).load().await?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| SentimentError::ModelConfig(format!("failed to parse config.json: {e}")))?;
        if config.id2label.is_empty() {
            return Err(SentimentError::ModelConfig(
                "config.json has no id2label table".to_string(),
            ));
        }

        let weights_filename = WeightsLoader::new(&source).load().await?;

        let dtype = DType::F32;
        let vb = if weights_filename
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            // SAFETY: the hub cache file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_filename], dtype, &device)? }
        } else if weights_filename
            .extension()
            .is_some_and(|ext| ext == "bin")
        {
            VarBuilder::from_pth(&weights_filename, dtype, &device)?
        } else {
            return Err(SentimentError::ModelFormat(format!(
                "unsupported weight file format: {weights_filename:?}"
            )));
        };

        let model = RobertaForSequenceClassification::load(vb, &config)?;

        Ok(Self {
            model,
            device,
            max_input_len: config.max_input_len(),
            id2label: config.id2label,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult> {
        // Tokenize
        let tokens = tokenizer
            .encode(text, true)
            .map_err(|e| SentimentError::Tokenization(e.to_string()))?;
        let token_ids = tokens.get_ids();
        if token_ids.len() > self.max_input_len {
            return Err(SentimentError::SequenceTooLong {
                len: token_ids.len(),
                max: self.max_input_len,
            });
        }
        let attention_mask_vals = tokens.get_attention_mask();

        // Prepare tensors
        let input_ids_tensor = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let attention_mask_tensor = Tensor::new(attention_mask_vals, &self.device)?.unsqueeze(0)?;

        // Forward pass
        let logits = self
            .model
            .forward(&input_ids_tensor, &attention_mask_tensor)?
            .squeeze(0)?;

        top_prediction(&logits, &self.id2label)
    }

    pub async fn get_tokenizer(source: ModelSource) -> Result<Tokenizer> {
        TokenizerLoader::new(&source).load().await
    }
}

/// Softmax over a single row of logits, returning the arg-max label and its
/// probability.
pub fn top_prediction(logits: &Tensor, id2label: &HashMap<String, String>) -> Result<SentimentResult> {
    let probabilities = softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?;
    let class = probabilities.argmax(D::Minus1)?.to_scalar::<u32>()?;
    let score = probabilities.get(class as usize)?.to_scalar::<f32>()?;

    let label = id2label
        .get(&class.to_string())
        .ok_or(SentimentError::UnknownClass(class))?
        .clone();

    Ok(SentimentResult { label, score })
}

impl SentimentAnalysisModel for SentimentRobertaModel {
    type Options = ModelSource;

    async fn new(options: Self::Options, device: Device) -> Result<Self> {
        SentimentRobertaModel::new(options, device).await
    }

    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult> {
        self.predict_with_score(tokenizer, text)
    }

    async fn get_tokenizer(options: Self::Options) -> Result<Tokenizer> {
        SentimentRobertaModel::get_tokenizer(options).await
    }

    fn device(&self) -> &Device {
        self.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cardiff_labels() -> HashMap<String, String> {
        HashMap::from([
            ("0".to_string(), "negative".to_string()),
            ("1".to_string(), "neutral".to_string()),
            ("2".to_string(), "positive".to_string()),
        ])
    }

    #[test]
    fn top_prediction_reports_argmax_probability() {
        let logits = Tensor::new(&[0.0f32, 0.0, 2.0], &Device::Cpu).unwrap();
        let result = top_prediction(&logits, &cardiff_labels()).unwrap();

        assert_eq!(result.label, "positive");
        let expected = 2.0f32.exp() / (2.0 + 2.0f32.exp());
        assert!((result.score - expected).abs() < 1e-5);
    }

    #[test]
    fn uniform_logits_split_probability_evenly() {
        let logits = Tensor::new(&[1.0f32, 1.0, 1.0], &Device::Cpu).unwrap();
        let result = top_prediction(&logits, &cardiff_labels()).unwrap();

        assert!(cardiff_labels().values().any(|l| *l == result.label));
        assert!((result.score - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn class_missing_from_id2label_is_an_error() {
        let logits = Tensor::new(&[0.0f32, 0.0, 0.0, 5.0], &Device::Cpu).unwrap();
        let err = top_prediction(&logits, &cardiff_labels()).unwrap_err();
        assert!(matches!(err, SentimentError::UnknownClass(3)));
    }
}
