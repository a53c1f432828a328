pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod network;
pub mod nltk;
pub mod provision;
pub mod runner;
pub mod suggest;
pub mod tiktoken;

pub use error::{LoadError, PrewarmError, Result};
