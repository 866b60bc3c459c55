//! # Configuration
//!
//! Server settings, resolved in three layers (later wins):
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config lineage.toml`)
//! 3. Environment variables
//!
//! CLI flags such as `--host`/`--port` are applied on top by the caller.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! cors_origins = "http://localhost:3000"
//! rate_limit = 100
//! api_key = "secret"
//! ```
//!
//! ## Environment Variables
//!
//! - `LINEAGE_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all
//! - `LINEAGE_RATE_LIMIT`: Requests per second (0 disables)
//! - `LINEAGE_API_KEY`: If set and non-empty, requires Bearer authentication

use lineage_core::LineageError;
use serde::Deserialize;
use std::path::Path;

/// Default request body limit (64 KiB); person payloads are tiny.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` means localhost only; `"*"` allows every origin.
    pub cors_origins: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bearer token; `None` disables authentication.
    pub api_key: Option<String>,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            api_key: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Config {
    /// Load defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, LineageError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    LineageError::IoError(format!(
                        "Cannot read config '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                tracing::info!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, LineageError> {
        toml::from_str(text)
            .map_err(|e| LineageError::InvalidInput(format!("Invalid config: {}", e)))
    }

    /// Apply `LINEAGE_*` overrides read through `lookup`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origins) = lookup("LINEAGE_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
        if let Some(raw) = lookup("LINEAGE_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(rps) => self.server.rate_limit = rps,
                Err(e) => tracing::warn!("Ignoring LINEAGE_RATE_LIMIT '{}': {}", raw, e),
            }
        }
        if let Some(key) = lookup("LINEAGE_API_KEY") {
            self.server.api_key = Some(key);
        }
        self.server.api_key = self.server.api_key.take().filter(|k| !k.is_empty());
    }
}

// =============================================================================
// TESTS
// =============================================================================
