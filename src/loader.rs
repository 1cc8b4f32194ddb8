//! Model Loader: builds the classifier capability once at startup.
//!
//! A failed load is logged and yields `None`; the server still starts and
//! every analysis request gets the fallback payload. There is no retry.

use crate::error::{Result, SentimentError};
use crate::loaders::ModelSource;
use crate::pipelines::utils::DeviceRequest;
use crate::pipelines::{SentimentAnalysisPipelineBuilder, SentimentClassifier};
use std::future::Future;
use std::sync::Arc;

pub type Capability = Arc<dyn SentimentClassifier>;

#[derive(Debug, Clone)]
pub struct ModelLoader {
    source: ModelSource,
    device_request: DeviceRequest,
}

impl ModelLoader {
    pub fn new(source: ModelSource, device_request: DeviceRequest) -> Self {
        Self {
            source,
            device_request,
        }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    /// Downloads and binds the RoBERTa classifier and its tokenizer.
    pub async fn load(self) -> Option<Capability> {
        let model_id = self.source.repo.clone();
        acquire_capability(&model_id, async move {
            let pipeline = SentimentAnalysisPipelineBuilder::roberta(self.source)
                .device_request(self.device_request)
                .build()
                .await?;
            tracing::info!(device = ?pipeline.device(), "classifier bound to tokenizer");
            Ok::<Capability, SentimentError>(Arc::new(pipeline))
        })
        .await
    }
}

/// Runs `acquire` once, logging start and result. Errors are absorbed.
pub async fn acquire_capability<F>(model_id: &str, acquire: F) -> Option<Capability>
where
    F: Future<Output = Result<Capability>>,
{
    tracing::info!("Loading Hugging Face model: {model_id}...");
    let started = std::time::Instant::now();

    match acquire.await {
        Ok(capability) => {
            tracing::info!(
                duration_ms = started.elapsed().as_millis() as u64,
                "Model loaded successfully."
            );
            Some(capability)
        }
        Err(e) => {
            tracing::error!(model = model_id, error = %e, "Error loading model");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::SentimentResult;

    struct AlwaysPositive;

    impl SentimentClassifier for AlwaysPositive {
        fn classify(&self, _text: &str) -> Result<SentimentResult> {
            Ok(SentimentResult {
                label: "positive".to_string(),
                score: 0.9,
            })
        }
    }

    #[tokio::test]
    async fn failed_acquisition_leaves_capability_absent() {
        let capability = acquire_capability("org/missing", async {
            Err::<Capability, _>(SentimentError::Download("404 Not Found".to_string()))
        })
        .await;
        assert!(capability.is_none());
    }

    #[tokio::test]
    async fn successful_acquisition_is_returned() {
        let capability = acquire_capability("org/model", async {
            Ok::<Capability, SentimentError>(Arc::new(AlwaysPositive))
        })
        .await
        .unwrap();
        assert_eq!(capability.classify("hi").unwrap().label, "positive");
    }

    #[test]
    fn loader_keeps_requested_source() {
        let loader = ModelLoader::new(
            ModelSource::new("org/model").with_revision("v1"),
            DeviceRequest::Cpu,
        );
        assert_eq!(loader.source().repo, "org/model");
        assert_eq!(loader.source().revision, "v1");
    }
}
