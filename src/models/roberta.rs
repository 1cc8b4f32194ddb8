//! RoBERTa encoder with a sequence-classification head.
//!
//! RoBERTa is a BERT-style post-layer-norm encoder. It differs from BERT in two
//! places that matter for inference:
//! - position ids start after the padding index, so padded positions share the
//!   padding embedding while real tokens are numbered `padding_idx + 1..`
//! - the classification head reads the `<s>` token through a tanh projection
//!   instead of a pooler layer
//!
//! Weight names follow the Hugging Face `RobertaForSequenceClassification`
//! checkpoint layout (`roberta.embeddings.*`, `roberta.encoder.layer.N.*`,
//! `classifier.dense`, `classifier.out_proj`).

use candle_core::{DType, IndexOp, Module, Result, Tensor, D};
use candle_nn::{embedding, layer_norm, linear, ops::softmax, Embedding, LayerNorm, Linear, VarBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const MIN_VALUE_F64: f64 = f32::MIN as f64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

fn default_type_vocab_size() -> usize {
    1
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}

fn default_pad_token_id() -> u32 {
    1
}

impl Config {
    /// Number of classes the classification head predicts.
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }

    /// Longest input (special tokens included) the position table can address.
    pub fn max_input_len(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.pad_token_id as usize + 1)
    }
}

/// Position ids for RoBERTa: non-padding tokens are numbered from
/// `padding_idx + 1`, padding tokens keep `padding_idx`.
pub fn create_position_ids(input_ids: &[u32], padding_idx: u32) -> Vec<u32> {
    let mut position = padding_idx;
    input_ids
        .iter()
        .map(|&id| {
            if id == padding_idx {
                padding_idx
            } else {
                position += 1;
                position
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    padding_idx: u32,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let word_embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let layer_norm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;

        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
            padding_idx: config.pad_token_id,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (batch, seq_len) = input_ids.dims2()?;

        let ids = input_ids.to_vec2::<u32>()?;
        let position_ids: Vec<u32> = ids
            .iter()
            .flat_map(|row| create_position_ids(row, self.padding_idx))
            .collect();
        let position_ids = Tensor::from_vec(position_ids, (batch, seq_len), input_ids.device())?;
        let token_type_ids = input_ids.zeros_like()?;

        let embeddings = input_ids.apply(&self.word_embeddings)?;
        let embeddings = (embeddings + position_ids.apply(&self.position_embeddings)?)?;
        let embeddings = (embeddings + token_type_ids.apply(&self.token_type_embeddings)?)?;
        embeddings.apply(&self.layer_norm)
    }
}

/// Multi-head self-attention followed by the residual output projection.
#[derive(Debug, Clone)]
struct Attention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    output_norm: LayerNorm,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl Attention {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        let attention_head_size = hidden / config.num_attention_heads;

        Ok(Self {
            query: linear(hidden, hidden, vb.pp("self.query"))?,
            key: linear(hidden, hidden, vb.pp("self.key"))?,
            value: linear(hidden, hidden, vb.pp("self.value"))?,
            output: linear(hidden, hidden, vb.pp("output.dense"))?,
            output_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((
            batch,
            seq_len,
            self.num_attention_heads,
            self.attention_head_size,
        ))?
        .transpose(1, 2)?
        .contiguous()
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let q = (q * scale)?;

        let attention_scores = q.matmul(&k.t()?)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax(&attention_scores, D::Minus1)?;

        let context = attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden_size))?;

        (context.apply(&self.output)? + hidden_states)?.apply(&self.output_norm)
    }
}

/// Feed-forward block: GELU intermediate projection plus residual norm.
#[derive(Debug, Clone)]
struct FeedForward {
    intermediate: Linear,
    output: Linear,
    output_norm: LayerNorm,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate.dense"),
            )?,
            output: linear(
                config.intermediate_size,
                config.hidden_size,
                vb.pp("output.dense"),
            )?,
            output_norm: layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                vb.pp("output.LayerNorm"),
            )?,
        })
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let hidden = xs.apply(&self.intermediate)?.gelu_erf()?.apply(&self.output)?;
        (hidden + xs)?.apply(&self.output_norm)
    }
}

#[derive(Debug, Clone)]
struct EncoderLayer {
    attention: Attention,
    feed_forward: FeedForward,
}

impl EncoderLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            attention: Attention::load(vb.pp("attention"), config)?,
            feed_forward: FeedForward::load(vb.clone(), config)?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        self.attention
            .forward(hidden_states, attention_mask)?
            .apply(&self.feed_forward)
    }
}

/// Task-specific head: `<s>` token → dense → tanh → out_proj.
#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    out_proj: Linear,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            dense: linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?,
            out_proj: linear(config.hidden_size, config.num_labels(), vb.pp("out_proj"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor) -> Result<Tensor> {
        hidden_states
            .i((.., 0, ..))?
            .contiguous()?
            .apply(&self.dense)?
            .tanh()?
            .apply(&self.out_proj)
    }
}

/// Shared encoder weights.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    embeddings: Embeddings,
    layers: Vec<EncoderLayer>,
    dtype: DType,
}

impl ModelWeights {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = Embeddings::load(vb.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for layer_idx in 0..config.num_hidden_layers {
            layers.push(EncoderLayer::load(
                vb.pp(format!("encoder.layer.{layer_idx}")),
                config,
            )?);
        }

        Ok(Self {
            embeddings,
            layers,
            dtype: vb.dtype(),
        })
    }

    /// Additive mask of shape `(batch, 1, 1, seq_len)`: 0 for real tokens, a
    /// large negative value for padding.
    fn create_attention_mask(&self, mask: &Tensor) -> Result<Tensor> {
        let mask = mask.unsqueeze(1)?.unsqueeze(2)?.to_dtype(self.dtype)?;
        ((1.0 - mask)? * MIN_VALUE_F64)?.to_dtype(self.dtype)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let attention_mask = self.create_attention_mask(attention_mask)?;

        let mut hidden_states = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &attention_mask)?;
        }
        Ok(hidden_states)
    }
}

/// RoBERTa model for sequence classification.
#[derive(Debug, Clone)]
pub struct RobertaForSequenceClassification {
    weights: Arc<ModelWeights>,
    classifier: ClassificationHead,
}

impl RobertaForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let weights = Arc::new(ModelWeights::load(vb.pp("roberta"), config)?);
        let classifier = ClassificationHead::load(vb.pp("classifier"), config)?;
        Ok(Self {
            weights,
            classifier,
        })
    }

    /// Forward pass for sequence classification.
    ///
    /// # Arguments
    /// * `input_ids` - Token IDs with shape `(batch_size, sequence_length)`
    /// * `attention_mask` - Attention mask with shape `(batch_size, sequence_length)` (1 for real tokens, 0 for padding)
    ///
    /// # Returns
    /// Logits with shape `(batch_size, num_labels)`
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.weights.forward(input_ids, attention_mask)?;
        self.classifier.forward(&hidden_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn tiny_config() -> Config {
        Config {
            vocab_size: 16,
            hidden_size: 8,
            num_hidden_layers: 2,
            num_attention_heads: 2,
            intermediate_size: 16,
            max_position_embeddings: 12,
            type_vocab_size: 1,
            layer_norm_eps: 1e-5,
            pad_token_id: 1,
            id2label: HashMap::from([
                ("0".to_string(), "negative".to_string()),
                ("1".to_string(), "neutral".to_string()),
                ("2".to_string(), "positive".to_string()),
            ]),
        }
    }

    #[test]
    fn position_ids_skip_padding() {
        assert_eq!(create_position_ids(&[0, 7, 9, 2], 1), vec![2, 3, 4, 5]);
        assert_eq!(create_position_ids(&[0, 7, 2, 1, 1], 1), vec![2, 3, 4, 1, 1]);
        assert!(create_position_ids(&[], 1).is_empty());
    }

    #[test]
    fn max_input_len_reserves_padding_offset() {
        let mut config = tiny_config();
        assert_eq!(config.max_input_len(), 10);
        config.max_position_embeddings = 514;
        assert_eq!(config.max_input_len(), 512);
    }

    #[test]
    fn config_parses_checkpoint_json() {
        let json = r#"{
            "architectures": ["RobertaForSequenceClassification"],
            "vocab_size": 50265,
            "hidden_size": 768,
            "num_hidden_layers": 12,
            "num_attention_heads": 12,
            "intermediate_size": 3072,
            "max_position_embeddings": 514,
            "type_vocab_size": 1,
            "layer_norm_eps": 1e-05,
            "pad_token_id": 1,
            "id2label": {"0": "negative", "1": "neutral", "2": "positive"}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_labels(), 3);
        assert_eq!(config.id2label["2"], "positive");
        assert_eq!(config.max_input_len(), 512);
    }

    #[test]
    fn zero_weights_forward_yields_one_logit_row_per_sequence() -> Result<()> {
        let config = tiny_config();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = RobertaForSequenceClassification::load(vb, &config)?;

        let input_ids = Tensor::new(&[[0u32, 5, 6, 2], [0, 7, 2, 1]], &Device::Cpu)?;
        let attention_mask = Tensor::new(&[[1u32, 1, 1, 1], [1, 1, 1, 0]], &Device::Cpu)?;
        let logits = model.forward(&input_ids, &attention_mask)?;

        assert_eq!(logits.dims(), &[2, 3]);
        for row in logits.to_vec2::<f32>()? {
            assert!(row.iter().all(|v| v.is_finite()));
        }
        Ok(())
    }
}
