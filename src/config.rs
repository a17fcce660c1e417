//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/archgrade/config.toml` (XDG) or platform config dir
//! 2. Project config: `.archgrade.toml`
//! 3. Environment variables: `ARCHGRADE_*`, nested keys separated by `__`
//!    (e.g., `ARCHGRADE_ORACLE__API_KEY`)
//!
//! Every section is optional, so an empty configuration loads and evaluates
//! with the built-in catalog and no qualitative phase.
//!
//! ```toml
//! [catalog]
//! path = "/srv/archgrade/catalog.json"
//!
//! [oracle]
//! enabled = true
//! provider = "anthropic"
//! model = "claude-3-5-sonnet-20241022"
//! timeout_secs = 30
//!
//! [server]
//! api_key = "change-me"
//! ```
//!
//! When `oracle.api_key` is unset the provider's conventional environment
//! variable (`ANTHROPIC_API_KEY` or `OPENAI_API_KEY`) is used.

use std::ops::Deref;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::oracle::{OracleProvider, OracleSettings};

/// Oracle deadline applied when `oracle.timeout_secs` is unset.
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 60;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Service catalog source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file. The built-in price list is used when unset.
    pub path: Option<String>,
}

/// Qualitative (Phase 3) oracle configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleConfig {
    /// Phase 3 only runs when explicitly enabled.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: OracleProvider,
    pub api_key: Option<String>,
    /// Model override; each provider has a default.
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl OracleConfig {
    /// Resolved API key: configured value, then the provider's environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Oracle settings when the phase is enabled and a key is available.
    pub fn settings(&self) -> Option<OracleSettings> {
        if !self.enabled {
            return None;
        }

        let api_key = self.resolved_api_key()?;
        Some(OracleSettings {
            provider: self.provider,
            api_key,
            model: self.model.clone(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Bearer key required by `serve`. Requests are not authenticated when unset.
    pub api_key: Option<String>,
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Self::from_figment(
            Figment::new()
                // Layer 1: User config (lowest priority)
                .merge(Toml::file(user_config))
                // Layer 2: Project config
                .merge(Toml::file(".archgrade.toml"))
                // Layer 3: Environment variables (highest priority)
                .merge(Env::prefixed("ARCHGRADE_").split("__")),
        )
    }

    /// Extract a config from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(ConfigError::from)
    }

    /// User config path: ~/.config/archgrade/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("archgrade").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("archgrade").join("config.toml"))
            .unwrap_or_default()
    }
}
