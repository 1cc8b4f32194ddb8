pub mod roberta;
pub mod sentiment_roberta;

pub use sentiment_roberta::{SentimentRobertaModel, DEFAULT_MODEL_ID};
