use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::error::Result;
use crate::loaders::ModelSource;
use crate::models::{SentimentRobertaModel, DEFAULT_MODEL_ID};
use crate::pipelines::utils::DeviceRequest;

pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    pub async fn build(self) -> Result<SentimentAnalysisPipeline<M>> {
        let device = self.device_request.resolve()?;
        tracing::debug!(?device, options = ?self.options, "building sentiment pipeline");
        let model = M::new(self.options.clone(), device).await?;
        let tokenizer = M::get_tokenizer(self.options).await?;
        Ok(SentimentAnalysisPipeline { model, tokenizer })
    }
}

impl SentimentAnalysisPipelineBuilder<SentimentRobertaModel> {
    pub fn roberta(source: ModelSource) -> Self {
        Self::new(source)
    }

    /// Builder for the stock Twitter RoBERTa sentiment checkpoint.
    pub fn twitter_roberta() -> Self {
        Self::roberta(ModelSource::new(DEFAULT_MODEL_ID))
    }
}
