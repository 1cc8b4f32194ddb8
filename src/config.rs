//! Process configuration.
//!
//! Every option has a default that reproduces the stock service: the Twitter
//! RoBERTa checkpoint on `127.0.0.1:8000`, CORS open to the two local
//! front-end dev servers.

use crate::loaders::ModelSource;
use crate::models::DEFAULT_MODEL_ID;
use crate::pipelines::utils::DeviceRequest;
use crate::service::DEFAULT_ALLOWED_ORIGINS;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "sentiment-api")]
#[command(about = "Sentiment Analysis API: POSITIVE / NEGATIVE / NEUTRAL with a confidence score")]
#[command(version)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "SENTIMENT_API_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "SENTIMENT_API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Hugging Face repository of the sentiment checkpoint
    #[arg(long, env = "SENTIMENT_API_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Git revision (branch, tag, commit hash) of the checkpoint
    #[arg(long, env = "SENTIMENT_API_REVISION", default_value = "main")]
    pub revision: String,

    /// Run inference on the CPU even if CUDA is available
    #[arg(long, env = "SENTIMENT_API_CPU")]
    pub cpu: bool,

    /// Run inference on this CUDA device; startup fails to load the model if it cannot be opened
    #[arg(long, env = "SENTIMENT_API_CUDA_DEVICE", conflicts_with = "cpu")]
    pub cuda_device: Option<usize>,

    /// Origin allowed to make cross-origin requests (repeatable)
    #[arg(
        long = "allowed-origin",
        env = "SENTIMENT_API_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect::<Vec<_>>()
    )]
    pub allowed_origins: Vec<String>,

    /// Base log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, env = "SENTIMENT_API_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "SENTIMENT_API_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn model_source(&self) -> ModelSource {
        ModelSource::new(&self.model_id).with_revision(&self.revision)
    }

    pub fn device_request(&self) -> DeviceRequest {
        match (self.cpu, self.cuda_device) {
            (true, _) => DeviceRequest::Cpu,
            (false, Some(index)) => DeviceRequest::Cuda(index),
            (false, None) => DeviceRequest::Default,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
