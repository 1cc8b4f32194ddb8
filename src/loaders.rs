//! Model and tokenizer loading utilities for Hugging Face Hub integration.
//!
//! This module downloads (or resolves from the local hub cache) the files a
//! sequence-classification checkpoint is made of:
//! - Model configuration (`config.json`)
//! - Model weights (`model.safetensors`, falling back to `pytorch_model.bin`)
//! - Tokenizers (`tokenizer.json`, falling back to `vocab.json` + `merges.txt`)
//!
//! ## Main Types
//!
//! - [`ModelSource`] - A repository id pinned to a revision
//! - [`HfLoader`] - Generic Hugging Face file loader with retry logic
//! - [`TokenizerLoader`] - Loads RoBERTa-style tokenizers
//! - [`WeightsLoader`] - Locates the checkpoint weight file
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sentiment_api::loaders::{ModelSource, TokenizerLoader};
//!
//! # async fn run() -> sentiment_api::error::Result<()> {
//! let source = ModelSource::new("cardiffnlp/twitter-roberta-base-sentiment-latest");
//! let tokenizer = TokenizerLoader::new(&source).load().await?;
//! # Ok(())
//! # }
//! ```
//!
//! All file fetches retry when the hub cache reports a lock acquisition
//! failure, which happens when two processes populate the same cache.

use crate::error::{Result, SentimentError};
use hf_hub::api::tokio::{ApiBuilder, ApiError};
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};
use tokenizers::models::bpe::BPE;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::processors::roberta::RobertaProcessing;
use tokenizers::Tokenizer;

const MAX_RETRIES: u32 = 3;

/// A Hugging Face model repository pinned to a git revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub repo: String,
    pub revision: String,
}

impl ModelSource {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            revision: "main".to_string(),
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub source: ModelSource,
    pub filename: String,
}

impl HfLoader {
    pub fn new(source: &ModelSource, filename: &str) -> Self {
        Self {
            source: source.clone(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> Result<PathBuf> {
        let hf_api = ApiBuilder::new().with_chunk_size(None).build()?;
        let hf_repo = hf_api.repo(Repo::with_revision(
            self.source.repo.clone(),
            RepoType::Model,
            self.source.revision.clone(),
        ));

        let mut attempt = 0;
        loop {
            match hf_repo.get(self.filename.as_str()).await {
                Ok(path) => return Ok(path),
                Err(e) if is_lock_contention(&e) && attempt + 1 < MAX_RETRIES => {
                    let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                    tracing::debug!(
                        file = %self.filename,
                        attempt,
                        "hub cache locked, retrying in {:?}",
                        wait_time
                    );
                    tokio::time::sleep(wait_time).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(SentimentError::Download(format!(
                        "{}/{}: {e}",
                        self.source.repo, self.filename
                    )))
                }
            }
        }
    }
}

fn is_lock_contention(error: &ApiError) -> bool {
    error.to_string().contains("Lock acquisition failed")
}

/// Fetches `config.json` for a checkpoint.
#[derive(Clone)]
pub struct ConfigLoader {
    pub config_file_loader: HfLoader,
}

impl ConfigLoader {
    pub fn new(source: &ModelSource) -> Self {
        Self {
            config_file_loader: HfLoader::new(source, "config.json"),
        }
    }

    /// Returns the raw JSON text so callers can deserialize several views of it.
    pub async fn load(&self) -> Result<String> {
        let config_path = self.config_file_loader.load().await?;
        read_config(&config_path)
    }
}

/// Reads a downloaded `config.json`. Filesystem failures surface as
/// [`SentimentError::Io`].
pub fn read_config(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Locates the weight file of a checkpoint.
#[derive(Clone)]
pub struct WeightsLoader {
    pub safetensors_loader: HfLoader,
    pub pytorch_loader: HfLoader,
}

impl WeightsLoader {
    pub fn new(source: &ModelSource) -> Self {
        Self {
            safetensors_loader: HfLoader::new(source, "model.safetensors"),
            pytorch_loader: HfLoader::new(source, "pytorch_model.bin"),
        }
    }

    pub async fn load(&self) -> Result<PathBuf> {
        match self.safetensors_loader.load().await {
            Ok(path) => Ok(path),
            Err(_) => self.pytorch_loader.load().await.map_err(|e| {
                SentimentError::ModelFormat(format!(
                    "expected `model.safetensors` or `pytorch_model.bin`: {e}"
                ))
            }),
        }
    }
}

#[derive(Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
    pub vocab_file_loader: HfLoader,
    pub merges_file_loader: HfLoader,
}

impl TokenizerLoader {
    pub fn new(source: &ModelSource) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(source, "tokenizer.json"),
            vocab_file_loader: HfLoader::new(source, "vocab.json"),
            merges_file_loader: HfLoader::new(source, "merges.txt"),
        }
    }

    /// Loads `tokenizer.json` when the repository ships one, otherwise builds a
    /// byte-level BPE tokenizer from the slow-tokenizer vocabulary files.
    pub async fn load(&self) -> Result<Tokenizer> {
        if let Ok(tokenizer_file_path) = self.tokenizer_file_loader.load().await {
            return Tokenizer::from_file(tokenizer_file_path)
                .map_err(|e| SentimentError::TokenizerNotFound(e.to_string()));
        }

        tracing::debug!("no tokenizer.json in repository, assembling from vocab.json + merges.txt");
        let vocab = self.vocab_file_loader.load().await?;
        let merges = self.merges_file_loader.load().await?;
        byte_level_bpe(&vocab, &merges)
    }
}

/// Builds a RoBERTa tokenizer: byte-level BPE without a prefix space, wrapped
/// as `<s> text </s>`.
pub fn byte_level_bpe(vocab: &Path, merges: &Path) -> Result<Tokenizer> {
    let (vocab, merges) = match (vocab.to_str(), merges.to_str()) {
        (Some(v), Some(m)) => (v, m),
        _ => {
            return Err(SentimentError::TokenizerNotFound(
                "tokenizer file paths are not valid UTF-8".to_string(),
            ))
        }
    };
    let bpe = BPE::from_file(vocab, merges)
        .build()
        .map_err(|e| SentimentError::TokenizerNotFound(e.to_string()))?;

    let mut tokenizer = Tokenizer::new(bpe);
    let special = |token: &str| {
        tokenizer.token_to_id(token).ok_or_else(|| {
            SentimentError::TokenizerNotFound(format!("vocabulary has no `{token}` token"))
        })
    };
    let cls = special("<s>")?;
    let sep = special("</s>")?;

    tokenizer
        .with_pre_tokenizer(Some(ByteLevel::default().add_prefix_space(false)))
        .with_decoder(Some(ByteLevel::default()))
        .with_post_processor(Some(
            RobertaProcessing::new(("</s>".to_string(), sep), ("<s>".to_string(), cls))
                .trim_offsets(true)
                .add_prefix_space(false),
        ));

    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_source_defaults_to_main() {
        let source = ModelSource::new("org/model");
        assert_eq!(source.revision, "main");
        assert_eq!(source.with_revision("v2").revision, "v2");
    }

    #[test]
    fn missing_config_is_an_io_error() {
        let path = std::env::temp_dir().join("sentiment-api-no-such-dir/config.json");
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, SentimentError::Io(_)));
    }

    #[test]
    fn byte_level_bpe_wraps_input_in_special_tokens() {
        let dir = std::env::temp_dir().join(format!("sentiment-api-bpe-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vocab = dir.join("vocab.json");
        let merges = dir.join("merges.txt");
        std::fs::write(
            &vocab,
            r#"{"<s>":0,"<pad>":1,"</s>":2,"<unk>":3,"h":4,"i":5,"hi":6}"#,
        )
        .unwrap();
        std::fs::write(&merges, "#version: 0.2\nh i\n").unwrap();

        let tokenizer = byte_level_bpe(&vocab, &merges).unwrap();
        let encoding = tokenizer.encode("hi", true).unwrap();
        assert_eq!(encoding.get_ids(), &[0, 6, 2]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
