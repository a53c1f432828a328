use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main settings structure
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub tiktoken: TiktokenSettings,
    #[serde(default)]
    pub nltk: NltkSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct TiktokenSettings {
    #[serde(default = "default_tiktoken_cache_dir")]
    pub cache_dir: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NltkSettings {
    /// Falls back to `~/nltk_data` when unset
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_nltk_base_url")]
    pub base_url: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NetworkSettings {
    #[serde(default)]
    pub tls_verify: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct RunSettings {
    /// Exit non-zero when every resource of a non-empty batch failed
    #[serde(default)]
    pub fail_when_all_failed: bool,
}

pub const DEFAULT_TIKTOKEN_CACHE_DIR: &str = "/app/api/.tiktoken_cache";
pub const DEFAULT_NLTK_BASE_URL: &str = "https://raw.githubusercontent.com/nltk/nltk_data/gh-pages";

// Default value functions
fn default_tiktoken_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TIKTOKEN_CACHE_DIR)
}
fn default_nltk_base_url() -> String {
    DEFAULT_NLTK_BASE_URL.to_string()
}
const fn default_timeout_secs() -> u64 {
    300
}

impl Default for TiktokenSettings {
    fn default() -> Self {
        Self {
            cache_dir: default_tiktoken_cache_dir(),
        }
    }
}

impl Default for NltkSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: default_nltk_base_url(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            tls_verify: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}
