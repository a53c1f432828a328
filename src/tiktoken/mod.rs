//! Tokenizer encoding cache warmer
//!
//! Resolves model and encoding names to BPE encodings, reads their rank files
//! through a [`BlobCache`] and proves each encoding works by encoding a short
//! test string.

pub mod bpe;
pub mod load;
pub mod registry;

pub use bpe::CoreBpe;
pub use load::BlobCache;
pub use registry::{encoding_name_for_model, EncodingInfo};

use crate::error::LoadError;
use crate::provision::{Loaded, Loader, ResourceKind, ResourceSpec, StepProgress};
use async_trait::async_trait;
use registry::RankSource;
use std::collections::HashMap;

/// Text encoded to validate a freshly loaded encoding
pub const TEST_TEXT: &str = "Hello, world!";

/// Models and encodings cached in batch mode
pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec::new(ResourceKind::Model, "gpt-3.5-turbo"),
    ResourceSpec::new(ResourceKind::Model, "gpt-4"),
    ResourceSpec::new(ResourceKind::Model, "gpt2"),
    ResourceSpec::new(ResourceKind::Model, "text-davinci-003"),
    ResourceSpec::new(ResourceKind::Encoding, "p50k_base"),
    ResourceSpec::new(ResourceKind::Encoding, "cl100k_base"),
    ResourceSpec::new(ResourceKind::Encoding, "r50k_base"),
];

/// A ready-to-use encoding
#[derive(Debug)]
pub struct Encoding {
    pub name: &'static str,
    pub bpe: CoreBpe,
}

impl Loaded for Encoding {
    fn validate(&self) -> Result<usize, LoadError> {
        let tokens = self.bpe.token_count(TEST_TEXT)?;
        if tokens == 0 {
            return Err(LoadError::Decode(format!(
                "Encoding {} produced no tokens for the test text",
                self.name
            )));
        }
        Ok(tokens)
    }
}

/// Loads encodings by model or encoding name
pub struct TiktokenLoader {
    cache: BlobCache,
    encodings: &'static [EncodingInfo],
}

impl TiktokenLoader {
    /// Loader over the built-in encoding registry
    #[must_use]
    pub const fn new(cache: BlobCache) -> Self {
        Self::with_encodings(cache, registry::ENCODINGS)
    }

    /// Loader over a custom encoding table, e.g. a mirror with its own URLs
    #[must_use]
    pub const fn with_encodings(cache: BlobCache, encodings: &'static [EncodingInfo]) -> Self {
        Self { cache, encodings }
    }

    /// Resolve a resource to its encoding entry without touching the network
    pub fn resolve(&self, resource: &ResourceSpec) -> Result<&'static EncodingInfo, LoadError> {
        let encoding_name = match resource.kind {
            ResourceKind::Model => encoding_name_for_model(&resource.name)
                .ok_or_else(|| LoadError::UnknownModel(resource.name.to_string()))?,
            ResourceKind::Encoding => resource.name.as_ref(),
            ResourceKind::Package => {
                return Err(LoadError::UnsupportedKind {
                    kind: resource.kind,
                    loader: "tiktoken",
                })
            }
        };

        EncodingInfo::find_in(self.encodings, encoding_name).ok_or_else(|| {
            LoadError::UnknownEncoding {
                name: encoding_name.to_string(),
                suggestion: EncodingInfo::suggest_in(self.encodings, encoding_name),
            }
        })
    }

    async fn load_ranks(
        &self,
        info: &EncodingInfo,
        progress: &StepProgress,
    ) -> Result<bpe::Ranks, LoadError> {
        match info.source {
            RankSource::Tiktoken { url, sha256 } => {
                let data = self.cache.read(url, Some(sha256), progress).await?;
                load::parse_tiktoken_bpe(&data)
            }
            RankSource::DataGym {
                vocab_bpe_url,
                vocab_bpe_sha256,
                encoder_json_url,
                encoder_json_sha256,
            } => {
                let vocab_bpe = self
                    .cache
                    .read(vocab_bpe_url, Some(vocab_bpe_sha256), progress)
                    .await?;
                let encoder_json = self
                    .cache
                    .read(encoder_json_url, Some(encoder_json_sha256), progress)
                    .await?;
                load::parse_data_gym(&vocab_bpe, &encoder_json)
            }
        }
    }
}

#[async_trait]
impl Loader for TiktokenLoader {
    type Handle = Encoding;

    fn name(&self) -> &'static str {
        "tiktoken"
    }

    async fn load(
        &self,
        resource: &ResourceSpec,
        progress: &StepProgress,
    ) -> Result<Encoding, LoadError> {
        let info = self.resolve(resource)?;
        tracing::debug!("{resource} uses encoding {} from {:?}", info.name, info.urls());

        let ranks = self.load_ranks(info, progress).await?;
        let special_tokens: HashMap<String, bpe::Rank> = info
            .special_tokens
            .iter()
            .map(|&(text, rank)| (text.to_string(), rank))
            .collect();

        let bpe = CoreBpe::new(ranks, special_tokens, info.pattern)?;

        if let Some(expected) = info.n_vocab {
            if bpe.n_vocab() != expected {
                return Err(LoadError::Decode(format!(
                    "Encoding {} has {} tokens, expected {expected}",
                    info.name,
                    bpe.n_vocab()
                )));
            }
        }

        Ok(Encoding {
            name: info.name,
            bpe,
        })
    }
}
