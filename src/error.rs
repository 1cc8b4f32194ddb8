use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    // Model loading
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Invalid model format: {0}")]
    ModelFormat(String),

    #[error("Model config error: {0}")]
    ModelConfig(String),

    // Tokenization
    #[error("Tokenizer not found: {0}")]
    TokenizerNotFound(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Input of {len} tokens exceeds the model limit of {max} tokens")]
    SequenceTooLong { len: usize, max: usize },

    // Inference
    #[error("Predicted class {0} has no entry in id2label")]
    UnknownClass(u32),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<hf_hub::api::tokio::ApiError> for SentimentError {
    fn from(value: hf_hub::api::tokio::ApiError) -> Self {
        SentimentError::Download(value.to_string())
    }
}
