use crate::error::{PrewarmError, Result};
use std::time::Duration;

const HTTP_PROXY_VARS: [&str; 2] = ["HTTP_PROXY_2", "http_proxy"];
const HTTPS_PROXY_VARS: [&str; 2] = ["HTTPS_PROXY_2", "https_proxy"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Proxy and TLS settings handed to every HTTP client the loaders use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub tls_verify: bool,
    pub timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_proxy: None,
            https_proxy: None,
            tls_verify: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NetworkConfig {
    /// Read proxy settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read proxy settings through `lookup`.
    ///
    /// Each protocol takes the first non-empty variable of its pair. When
    /// only one protocol is set, its value is used for both.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|&name| lookup(name).filter(|value| !value.is_empty()))
        };

        let http = first(&HTTP_PROXY_VARS[..]);
        let https = first(&HTTPS_PROXY_VARS[..]);

        Self {
            http_proxy: http.clone().or_else(|| https.clone()),
            https_proxy: https.or(http),
            ..Self::default()
        }
    }

    /// Disable certificate verification for outbound HTTPS
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.tls_verify = false;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn proxy_installed(&self) -> bool {
        self.http_proxy.is_some() || self.https_proxy.is_some()
    }

    /// One-line summary of the proxy setup
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "HTTP={}, HTTPS={}",
            self.http_proxy.as_deref().unwrap_or("none"),
            self.https_proxy.as_deref().unwrap_or("none")
        )
    }

    /// Build an HTTP client carrying exactly these settings.
    ///
    /// System proxy variables other than the ones read above are ignored.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("prewarm/", env!("CARGO_PKG_VERSION")))
            .no_proxy();

        if let Some(url) = &self.http_proxy {
            let proxy = reqwest::Proxy::http(url)
                .map_err(|e| PrewarmError::Network(format!("Invalid HTTP proxy '{url}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(url) = &self.https_proxy {
            let proxy = reqwest::Proxy::https(url)
                .map_err(|e| PrewarmError::Network(format!("Invalid HTTPS proxy '{url}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        if !self.tls_verify {
            tracing::warn!("TLS certificate verification disabled");
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        builder
            .build()
            .map_err(|e| PrewarmError::Network(format!("Failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_proxy_vars() {
        let config = NetworkConfig::from_lookup(lookup_from(&[]));
        assert!(!config.proxy_installed());
        assert_eq!(config.describe(), "HTTP=none, HTTPS=none");
    }

    #[test]
    fn test_primary_name_takes_precedence() {
        let config = NetworkConfig::from_lookup(lookup_from(&[
            ("HTTP_PROXY_2", "http://primary:1"),
            ("http_proxy", "http://fallback:2"),
            ("HTTPS_PROXY_2", "http://secure-primary:3"),
            ("https_proxy", "http://secure-fallback:4"),
        ]));

        assert_eq!(config.http_proxy.as_deref(), Some("http://primary:1"));
        assert_eq!(config.https_proxy.as_deref(), Some("http://secure-primary:3"));
    }

    #[test]
    fn test_fallback_name_used_when_primary_missing_or_empty() {
        let config = NetworkConfig::from_lookup(lookup_from(&[
            ("HTTP_PROXY_2", ""),
            ("http_proxy", "http://fallback:2"),
        ]));

        assert_eq!(config.http_proxy.as_deref(), Some("http://fallback:2"));
    }

    #[test]
    fn test_https_only_applies_to_both() {
        let config =
            NetworkConfig::from_lookup(lookup_from(&[("https_proxy", "http://proxy:3128")]));

        assert!(config.proxy_installed());
        assert_eq!(config.http_proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn test_http_only_applies_to_both() {
        let config =
            NetworkConfig::from_lookup(lookup_from(&[("HTTP_PROXY_2", "http://proxy:8080")]));

        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:8080"));
    }

    #[test]
    fn test_insecure_mode() {
        let config = NetworkConfig::default();
        assert!(config.tls_verify);
        assert!(!config.insecure().tls_verify);
    }

    #[test]
    fn test_build_client() {
        let config = NetworkConfig::from_lookup(lookup_from(&[("http_proxy", "http://proxy:3128")]))
            .insecure();
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let config = NetworkConfig {
            http_proxy: Some("http://[::1".to_string()),
            ..NetworkConfig::default()
        };
        assert!(matches!(
            config.build_client(),
            Err(PrewarmError::Network(_))
        ));
    }
}
