use crate::suggest;
use crate::tiktoken::bpe::Rank;

/// Split pattern shared by the GPT-2 era encodings
pub const R50K_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

pub const CL100K_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

pub const ENDOFTEXT: &str = "<|endoftext|>";
pub const FIM_PREFIX: &str = "<|fim_prefix|>";
pub const FIM_MIDDLE: &str = "<|fim_middle|>";
pub const FIM_SUFFIX: &str = "<|fim_suffix|>";
pub const ENDOFPROMPT: &str = "<|endofprompt|>";

/// Where the mergeable ranks of an encoding come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSource {
    /// A `.tiktoken` file: one `<base64 token> <rank>` per line
    Tiktoken {
        url: &'static str,
        sha256: &'static str,
    },
    /// GPT-2 `vocab.bpe` merges plus `encoder.json`
    DataGym {
        vocab_bpe_url: &'static str,
        vocab_bpe_sha256: &'static str,
        encoder_json_url: &'static str,
        encoder_json_sha256: &'static str,
    },
}

/// Information about a BPE encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingInfo {
    pub name: &'static str,
    pub source: RankSource,
    pub pattern: &'static str,
    pub special_tokens: &'static [(&'static str, Rank)],
    /// Expected mergeable + special token count, when fixed
    pub n_vocab: Option<usize>,
}

const R50K_SOURCE: RankSource = RankSource::Tiktoken {
    url: "https://openaipublic.blob.core.windows.net/encodings/r50k_base.tiktoken",
    sha256: "306cd27f03c1a714eca7108e03d66b7dc042abe8c258b44c199a7ed9838dd930",
};

const P50K_SOURCE: RankSource = RankSource::Tiktoken {
    url: "https://openaipublic.blob.core.windows.net/encodings/p50k_base.tiktoken",
    sha256: "94b5ca7dff4d00767bc256fdd1b27e5b17361d7b8a5f968547f9f23eb70d2069",
};

/// Registry of known encodings
pub const ENCODINGS: &[EncodingInfo] = &[
    EncodingInfo {
        name: "gpt2",
        source: RankSource::DataGym {
            vocab_bpe_url: "https://openaipublic.blob.core.windows.net/gpt-2/encodings/main/vocab.bpe",
            vocab_bpe_sha256: "1ce1664773c50f3e0cc8842619a93edc4624525b728b188a9e0be33b7726adc5",
            encoder_json_url: "https://openaipublic.blob.core.windows.net/gpt-2/encodings/main/encoder.json",
            encoder_json_sha256: "196139668be63f3b5d6574427317ae82f02bfe8f4c3d64e3aaa7ee2ba1dd8e1c",
        },
        pattern: R50K_PATTERN,
        special_tokens: &[(ENDOFTEXT, 50256)],
        n_vocab: Some(50257),
    },
    EncodingInfo {
        name: "r50k_base",
        source: R50K_SOURCE,
        pattern: R50K_PATTERN,
        special_tokens: &[(ENDOFTEXT, 50256)],
        n_vocab: Some(50257),
    },
    EncodingInfo {
        name: "p50k_base",
        source: P50K_SOURCE,
        pattern: R50K_PATTERN,
        special_tokens: &[(ENDOFTEXT, 50256)],
        n_vocab: Some(50281),
    },
    EncodingInfo {
        name: "p50k_edit",
        source: P50K_SOURCE,
        pattern: R50K_PATTERN,
        special_tokens: &[
            (ENDOFTEXT, 50256),
            (FIM_PREFIX, 50281),
            (FIM_MIDDLE, 50282),
            (FIM_SUFFIX, 50283),
        ],
        n_vocab: None,
    },
    EncodingInfo {
        name: "cl100k_base",
        source: RankSource::Tiktoken {
            url: "https://openaipublic.blob.core.windows.net/encodings/cl100k_base.tiktoken",
            sha256: "223921b76ee99bde995b7ff738513eef100fb51d18c93597a113bcf3f0c84b5b",
        },
        pattern: CL100K_PATTERN,
        special_tokens: &[
            (ENDOFTEXT, 100_257),
            (FIM_PREFIX, 100_258),
            (FIM_MIDDLE, 100_259),
            (FIM_SUFFIX, 100_260),
            (ENDOFPROMPT, 100_276),
        ],
        n_vocab: None,
    },
];

/// Exact model names
const MODEL_TO_ENCODING: &[(&str, &str)] = &[
    // chat
    ("gpt-4", "cl100k_base"),
    ("gpt-3.5-turbo", "cl100k_base"),
    ("gpt-3.5", "cl100k_base"),
    ("gpt-35-turbo", "cl100k_base"),
    // base
    ("davinci-002", "cl100k_base"),
    ("babbage-002", "cl100k_base"),
    // embeddings
    ("text-embedding-ada-002", "cl100k_base"),
    ("text-embedding-3-small", "cl100k_base"),
    ("text-embedding-3-large", "cl100k_base"),
    // text
    ("text-davinci-003", "p50k_base"),
    ("text-davinci-002", "p50k_base"),
    ("text-davinci-001", "r50k_base"),
    ("text-curie-001", "r50k_base"),
    ("text-babbage-001", "r50k_base"),
    ("text-ada-001", "r50k_base"),
    ("davinci", "r50k_base"),
    ("curie", "r50k_base"),
    ("babbage", "r50k_base"),
    ("ada", "r50k_base"),
    // code
    ("code-davinci-002", "p50k_base"),
    ("code-davinci-001", "p50k_base"),
    ("code-cushman-002", "p50k_base"),
    ("code-cushman-001", "p50k_base"),
    ("davinci-codex", "p50k_base"),
    ("cushman-codex", "p50k_base"),
    // edit
    ("text-davinci-edit-001", "p50k_edit"),
    ("code-davinci-edit-001", "p50k_edit"),
    // old embeddings
    ("text-similarity-davinci-001", "r50k_base"),
    ("text-similarity-curie-001", "r50k_base"),
    ("text-similarity-babbage-001", "r50k_base"),
    ("text-similarity-ada-001", "r50k_base"),
    ("text-search-davinci-doc-001", "r50k_base"),
    ("text-search-curie-doc-001", "r50k_base"),
    ("text-search-babbage-doc-001", "r50k_base"),
    ("text-search-ada-doc-001", "r50k_base"),
    ("code-search-babbage-code-001", "r50k_base"),
    ("code-search-ada-code-001", "r50k_base"),
    // open source
    ("gpt2", "gpt2"),
    ("gpt-2", "gpt2"),
];

/// Versioned and fine-tuned model families
const MODEL_PREFIX_TO_ENCODING: &[(&str, &str)] = &[
    ("gpt-4-", "cl100k_base"),
    ("gpt-3.5-turbo-", "cl100k_base"),
    ("gpt-35-turbo-", "cl100k_base"),
    ("ft:gpt-4", "cl100k_base"),
    ("ft:gpt-3.5-turbo", "cl100k_base"),
    ("ft:davinci-002", "cl100k_base"),
    ("ft:babbage-002", "cl100k_base"),
];

impl EncodingInfo {
    /// Find encoding by name in the built-in registry
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        Self::find_in(ENCODINGS, name)
    }

    #[must_use]
    pub fn find_in(table: &'static [Self], name: &str) -> Option<&'static Self> {
        table.iter().find(|e| e.name == name)
    }

    /// Closest known encoding name, for error messages
    #[must_use]
    pub fn suggest(name: &str) -> Option<&'static str> {
        Self::suggest_in(ENCODINGS, name)
    }

    #[must_use]
    pub fn suggest_in(table: &'static [Self], name: &str) -> Option<&'static str> {
        suggest::closest(name, table.iter().map(|e| e.name))
    }

    /// Every source file URL this encoding needs
    #[must_use]
    pub fn urls(&self) -> Vec<&'static str> {
        match self.source {
            RankSource::Tiktoken { url, .. } => vec![url],
            RankSource::DataGym {
                vocab_bpe_url,
                encoder_json_url,
                ..
            } => vec![vocab_bpe_url, encoder_json_url],
        }
    }
}

/// Encoding name used by `model`, by exact name then by family prefix
#[must_use]
pub fn encoding_name_for_model(model: &str) -> Option<&'static str> {
    MODEL_TO_ENCODING
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| {
            MODEL_PREFIX_TO_ENCODING
                .iter()
                .find(|(prefix, _)| model.starts_with(prefix))
        })
        .map(|(_, encoding)| *encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB_BASE: &str = "https://openaipublic.blob.core.windows.net";

    #[test]
    fn test_find_encoding() {
        assert!(EncodingInfo::find("cl100k_base").is_some());
        assert!(EncodingInfo::find("gpt2").is_some());
        assert!(EncodingInfo::find("o200k_base").is_none());
    }

    #[test]
    fn test_lookup_in_custom_table() {
        let table = &ENCODINGS[..1];
        assert!(EncodingInfo::find_in(table, "gpt2").is_some());
        assert!(EncodingInfo::find_in(table, "r50k_base").is_none());
        assert_eq!(EncodingInfo::suggest_in(table, "r50k_bas"), None);
        assert_eq!(EncodingInfo::suggest("r50k_bas"), Some("r50k_base"));
    }

    #[test]
    fn test_model_mapping_exact() {
        assert_eq!(encoding_name_for_model("gpt-4"), Some("cl100k_base"));
        assert_eq!(encoding_name_for_model("gpt-3.5-turbo"), Some("cl100k_base"));
        assert_eq!(encoding_name_for_model("gpt2"), Some("gpt2"));
        assert_eq!(encoding_name_for_model("text-davinci-003"), Some("p50k_base"));
        assert_eq!(encoding_name_for_model("davinci"), Some("r50k_base"));
        assert_eq!(
            encoding_name_for_model("code-davinci-edit-001"),
            Some("p50k_edit")
        );
    }

    #[test]
    fn test_model_mapping_prefix() {
        assert_eq!(encoding_name_for_model("gpt-4-0613"), Some("cl100k_base"));
        assert_eq!(
            encoding_name_for_model("gpt-3.5-turbo-16k"),
            Some("cl100k_base")
        );
        assert_eq!(
            encoding_name_for_model("ft:gpt-3.5-turbo:org:custom:id"),
            Some("cl100k_base")
        );
        assert_eq!(encoding_name_for_model("gpt-4o"), None);
        assert_eq!(encoding_name_for_model("llama-3"), None);
    }

    #[test]
    fn test_every_mapping_targets_a_known_encoding() {
        for (_, encoding) in MODEL_TO_ENCODING.iter().chain(MODEL_PREFIX_TO_ENCODING) {
            assert!(EncodingInfo::find(encoding).is_some(), "{encoding}");
        }
    }

    #[test]
    fn test_sources_live_on_blob_store() {
        for info in ENCODINGS {
            for url in info.urls() {
                assert!(url.starts_with(BLOB_BASE), "{url}");
            }
        }
    }

    #[test]
    fn test_suggest() {
        assert_eq!(EncodingInfo::suggest("cl100k"), None);
        assert_eq!(EncodingInfo::suggest("cl100k_bas"), Some("cl100k_base"));
        assert_eq!(EncodingInfo::suggest("gtp2"), Some("gpt2"));
    }
}
