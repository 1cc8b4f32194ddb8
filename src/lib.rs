pub mod config;
pub mod error;
pub mod labels;
pub mod loader;
pub mod loaders;
pub mod logging;
pub mod models;
pub mod pipelines;
pub mod service;

// Re-export the types most callers need
pub use error::{Result, SentimentError};
pub use labels::SentimentLabel;
pub use loader::{Capability, ModelLoader};
pub use pipelines::{SentimentClassifier, SentimentResult};
pub use service::{AnalysisOutcome, SentimentRequest, SentimentResponse, SentimentService};
