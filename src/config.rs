//! Engine configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Introspection fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Default per-request timeout when a definition does not carry its own
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: format!("schemagate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Catalog resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on concurrently resolving entities
    pub max_concurrent_resolutions: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_resolutions: 8,
        }
    }
}

/// Complete engine settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub fetch: FetchConfig,
    pub resolver: ResolverConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let fetch = FetchConfig {
            timeout_seconds: std::env::var("SCHEMAGATE_FETCH_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| FetchConfig::default().timeout_seconds),
            user_agent: std::env::var("SCHEMAGATE_USER_AGENT")
                .unwrap_or_else(|_| FetchConfig::default().user_agent),
        };

        let resolver = ResolverConfig {
            max_concurrent_resolutions: std::env::var("SCHEMAGATE_MAX_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| ResolverConfig::default().max_concurrent_resolutions),
        };

        if resolver.max_concurrent_resolutions == 0 {
            return Err(ConfigError::InvalidValue(
                "SCHEMAGATE_MAX_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self { fetch, resolver })
    }
}
