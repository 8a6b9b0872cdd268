//! # Application State
//!
//! Shared state for the Axum application.
//! Immutable after startup: the session provider, the product catalog, and
//! the server config.

use shop_core::{BoxedSessionProvider, ProductCatalog};
use shop_primer::PrimerSessionProvider;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or unparsable values keep the defaults
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Client-session provider
    pub provider: BoxedSessionProvider,
    /// Product catalog
    pub catalog: Arc<ProductCatalog>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the production state: Primer provider from the environment
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let catalog = load_product_catalog()?;

        // A missing key is reported per request, not here
        let provider = PrimerSessionProvider::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Primer: {}", e))?;

        Ok(Self::with_provider(Arc::new(provider), catalog, config))
    }

    /// Assemble state from parts
    pub fn with_provider(
        provider: BoxedSessionProvider,
        catalog: ProductCatalog,
        config: AppConfig,
    ) -> Self {
        Self {
            provider,
            catalog: Arc::new(catalog),
            config,
        }
    }
}

/// Load product catalog from config file, falling back to the demo catalog
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if Path::new(path).exists() {
            return read_catalog(path);
        }
    }

    tracing::warn!("No product catalog found, using demo catalog");
    Ok(ProductCatalog::demo())
}

fn read_catalog(path: &str) -> anyhow::Result<ProductCatalog> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    let catalog = ProductCatalog::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
    tracing::info!("Loaded {} products from {}", catalog.len(), path);
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.is_production());
    }

    #[test]
    fn test_app_config_from_lookup() {
        let config = AppConfig::from_lookup(|name| match name {
            "HOST" => Some("0.0.0.0".to_string()),
            "PORT" => Some("not-a-port".to_string()),
            "ENVIRONMENT" => Some("production".to_string()),
            _ => None,
        });

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_socket_addr_invalid_host() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };

        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_catalog_file_matches_demo() {
        let catalog = read_catalog("../../config/products.toml").unwrap();
        let demo = ProductCatalog::demo();

        assert_eq!(catalog.len(), demo.len());
        assert_eq!(catalog.get("3"), demo.get("3"));
    }
}
