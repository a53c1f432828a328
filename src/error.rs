use crate::provision::ResourceKind;
use crate::suggest::did_you_mean;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal setup errors. Any of these stops the run before the batch starts.
#[derive(Error, Debug)]
pub enum PrewarmError {
    #[error("Cannot create cache directory {path}: {source}\n\nTroubleshooting:\n- Check that the parent directory is writable by the build user\n- Make sure no regular file exists at that path\n- Override the location with TIKTOKEN_CACHE_DIR or NLTK_DATA")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check the file named by PREWARM_CONFIG\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Network setup error: {0}\n\nTroubleshooting:\n- Check HTTP_PROXY_2 / http_proxy / HTTPS_PROXY_2 / https_proxy\n- Proxy values must be full URLs, e.g. http://proxy.local:3128")]
    Network(String),
}

/// Failure to provision a single resource. Reported and skipped, never fatal.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unknown encoding '{name}'{}", did_you_mean(.suggestion))]
    UnknownEncoding {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("Could not automatically map '{0}' to an encoding")]
    UnknownModel(String),

    #[error("Unknown package '{name}'{}", did_you_mean(.suggestion))]
    UnknownPackage {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("Cannot load a {kind} with the {loader} loader")]
    UnsupportedKind {
        kind: ResourceKind,
        loader: &'static str,
    },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Malformed data: {0}")]
    Decode(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrewarmError>;
