//! Settings for the provisioning binaries
//!
//! Built from embedded defaults, optionally overlaid with a TOML file named by
//! `PREWARM_CONFIG`, then overridden by the cache location variables
//! (`TIKTOKEN_CACHE_DIR`, `NLTK_DATA`).
//!
//! # Example
//!
//! ```no_run
//! use prewarm::config::Settings;
//!
//! let settings = Settings::load().expect("Failed to load settings");
//! println!("tiktoken cache: {}", settings.tiktoken.cache_dir.display());
//! ```

pub mod schema;

pub use schema::Settings;

use crate::cache::resolve_dir_with;
use crate::error::{PrewarmError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "PREWARM_CONFIG";
pub const TIKTOKEN_CACHE_ENV: &str = "TIKTOKEN_CACHE_DIR";
pub const NLTK_DATA_ENV: &str = "NLTK_DATA";

impl Settings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load settings using `lookup` in place of the process environment
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match lookup(CONFIG_ENV).filter(|v| !v.is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env(&lookup);
        Ok(settings)
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PrewarmError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        toml::from_str(&content).map_err(|e| {
            PrewarmError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        self.tiktoken.cache_dir =
            resolve_dir_with(lookup, TIKTOKEN_CACHE_ENV, &self.tiktoken.cache_dir);

        if let Some(dir) = lookup(NLTK_DATA_ENV).filter(|v| !v.is_empty()) {
            self.nltk.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory corpus packages are installed into
    pub fn nltk_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.nltk.data_dir {
            return Ok(dir.clone());
        }

        dirs::home_dir()
            .map(|home| home.join("nltk_data"))
            .ok_or_else(|| {
                PrewarmError::Config(format!(
                    "Cannot determine home directory; set {NLTK_DATA_ENV}"
                ))
            })
    }
}
