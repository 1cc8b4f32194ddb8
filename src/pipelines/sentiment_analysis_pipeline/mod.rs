//! Sentiment analysis pipeline for classifying text emotional tone.
//!
//! This module binds a sequence-classification model and its tokenizer into a
//! single callable that returns the model's label together with a confidence
//! score.
//!
//! ## Main Types
//!
//! - [`SentimentAnalysisPipeline`] - High-level interface for sentiment classification
//! - [`SentimentAnalysisPipelineBuilder`] - Builder pattern for pipeline configuration
//! - [`SentimentAnalysisModel`] - Trait for sentiment analysis model implementations
//! - [`SentimentClassifier`] - Object-safe view of a built pipeline
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sentiment_api::pipelines::sentiment_analysis_pipeline::*;
//!
//! # async fn run() -> sentiment_api::error::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::twitter_roberta()
//!     .cpu()
//!     .build()
//!     .await?;
//!
//! let result = pipeline.predict("I love this product!")?;
//! println!("Sentiment: {} (confidence: {:.2})", result.label, result.score);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::SentimentAnalysisPipelineBuilder;
pub use model::SentimentAnalysisModel;
pub use pipeline::{SentimentAnalysisPipeline, SentimentClassifier, SentimentResult};
