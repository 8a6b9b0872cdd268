//! # Primer Configuration
//!
//! Configuration management for the Primer integration.
//! The API key is read from the environment and may be absent at startup;
//! every proxied call checks for it before touching the network.

use shop_core::{CheckoutError, CheckoutResult};
use std::env;
use std::time::Duration;

/// Sandbox API host
pub const SANDBOX_API_URL: &str = "https://api.sandbox.primer.io";
/// Pinned API version sent as `X-Api-Version`
pub const DEFAULT_API_VERSION: &str = "2.4";
/// Upstream wait before giving up
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Values filled into the session request when the shopper left them blank
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub country_code: String,
    pub customer_email: String,
    pub line_item_id: String,
    pub line_item_description: String,
    pub metadata_source: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            country_code: "US".to_string(),
            customer_email: "test@example.com".to_string(),
            line_item_id: "test-item".to_string(),
            line_item_description: "Test Product".to_string(),
            metadata_source: "sandbox-testing".to_string(),
        }
    }
}

/// Primer API configuration
#[derive(Clone)]
pub struct PrimerConfig {
    /// Server-side API key; never sent to the browser
    pub api_key: Option<String>,

    /// API base URL (overridable for testing/mocking)
    pub api_base_url: String,

    /// API version header value
    pub api_version: String,

    /// Bounded wait for each upstream call
    pub timeout: Duration,

    /// Reported in session metadata
    pub environment: String,

    pub defaults: SessionDefaults,
}

impl PrimerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PRIMER_API_KEY` (required for proxying, optional at startup)
    /// - `PRIMER_API_URL` (default: sandbox)
    /// - `PRIMER_API_VERSION` (default: 2.4)
    /// - `PRIMER_TIMEOUT_SECS` (default: 10)
    /// - `ENVIRONMENT` (default: development)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`PrimerConfig::from_env`], reading variables through `get`
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = get("PRIMER_API_KEY").filter(|k| !k.trim().is_empty());

        if api_key.is_none() {
            tracing::warn!("PRIMER_API_KEY not set; client sessions will fail until it is");
        }

        Self {
            api_key,
            api_base_url: get("PRIMER_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| SANDBOX_API_URL.to_string()),
            api_version: get("PRIMER_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout: get("PRIMER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            defaults: SessionDefaults::default(),
        }
    }

    /// Create config with an explicit key (for testing)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::unconfigured()
        }
    }

    /// Config with no key at all
    pub fn unconfigured() -> Self {
        Self {
            api_key: None,
            api_base_url: SANDBOX_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            environment: "development".to_string(),
            defaults: SessionDefaults::default(),
        }
    }

    /// The API key, or a configuration error naming the variable to set
    pub fn require_api_key(&self) -> CheckoutResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            CheckoutError::Configuration(
                "Primer API key not configured. Please set PRIMER_API_KEY environment variable."
                    .to_string(),
            )
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Check if pointed at the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.api_base_url.contains("sandbox")
    }

    /// First characters of the key, for log lines
    pub fn masked_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(8).collect::<String>()),
            None => "<unset>".to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set upstream timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set reported environment
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

impl std::fmt::Debug for PrimerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimerConfig")
            .field("api_key", &self.masked_key())
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_require_api_key() {
        let config = PrimerConfig::unconfigured();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, CheckoutError::Configuration(_)));
        assert!(err.to_string().contains("PRIMER_API_KEY"));

        let config = PrimerConfig::new("sk_sandbox_123");
        assert_eq!(config.require_api_key().unwrap(), "sk_sandbox_123");
    }

    #[test]
    fn test_defaults() {
        let config = PrimerConfig::new("key");
        assert!(config.is_sandbox());
        assert_eq!(config.api_version, "2.4");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.defaults.country_code, "US");
    }

    #[test]
    fn test_debug_masks_key() {
        let config = PrimerConfig::new("0123456789abcdefSECRET");
        let shown = format!("{:?}", config);
        assert!(shown.contains("01234567..."));
        assert!(!shown.contains("SECRET"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = PrimerConfig::new("k").with_api_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_lookup_missing_key() {
        let config = PrimerConfig::from_lookup(lookup(&[]));
        assert!(!config.is_configured());
        assert!(config.is_sandbox());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let config = PrimerConfig::from_lookup(lookup(&[("PRIMER_API_KEY", "   ")]));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = PrimerConfig::from_lookup(lookup(&[
            ("PRIMER_API_KEY", "sk_sandbox_123"),
            ("PRIMER_API_URL", "http://127.0.0.1:9999/"),
            ("PRIMER_TIMEOUT_SECS", "3"),
            ("ENVIRONMENT", "production"),
        ]));

        assert_eq!(config.require_api_key().unwrap(), "sk_sandbox_123");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.environment, "production");
    }
}
