//! Qualitative scoring oracles.
//!
//! An oracle takes one natural-language prompt and returns generated text.
//! The evaluator only depends on the [`TextOracle`] trait; concrete HTTP
//! clients exist for Anthropic and OpenAI and are selected by
//! [`OracleProvider`].
//!
//! Clients make a single attempt per call. Deadlines and cancellation are
//! applied by the caller (see `services::qualitative`).

mod anthropic;
mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicOracle;
pub use openai::OpenAiOracle;

/// Errors from oracle calls and from parsing their answers.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} response contained no text")]
    EmptyResponse(&'static str),

    #[error("response is not a valid assessment: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be an integer between 1 and 10, got {value}")]
    ScoreOutOfRange { field: &'static str, value: u8 },

    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle call cancelled")]
    Cancelled,

    #[error("no API key configured for {0}")]
    MissingApiKey(OracleProvider),

    #[error("unsupported oracle provider '{0}'. Valid values: anthropic, openai")]
    UnsupportedProvider(String),
}

/// Named oracle backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl OracleProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => "anthropic",
            OracleProvider::OpenAi => "openai",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => "ANTHROPIC_API_KEY",
            OracleProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            OracleProvider::Anthropic => anthropic::DEFAULT_MODEL,
            OracleProvider::OpenAi => openai::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleProvider {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(OracleProvider::Anthropic),
            "openai" => Ok(OracleProvider::OpenAi),
            _ => Err(OracleError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Credentials and model selection for one oracle.
#[derive(Clone)]
pub struct OracleSettings {
    pub provider: OracleProvider,
    pub api_key: String,
    pub model: Option<String>,
}

impl fmt::Debug for OracleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// External text-generation backend consulted in Phase 3.
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;

    /// Provider name reported in results (e.g., "anthropic").
    fn provider_name(&self) -> &str;

    /// Model identifier reported in results.
    fn model_name(&self) -> &str;
}

/// Build the oracle client selected by `settings`.
pub fn build_oracle(settings: &OracleSettings) -> Result<Arc<dyn TextOracle>, OracleError> {
    if settings.api_key.trim().is_empty() {
        return Err(OracleError::MissingApiKey(settings.provider));
    }

    let model = settings
        .model
        .clone()
        .unwrap_or_else(|| settings.provider.default_model().to_string());

    let oracle: Arc<dyn TextOracle> = match settings.provider {
        OracleProvider::Anthropic => Arc::new(AnthropicOracle::new(settings.api_key.clone(), model)),
        OracleProvider::OpenAi => Arc::new(OpenAiOracle::new(settings.api_key.clone(), model)),
    };

    tracing::debug!(
        provider = oracle.provider_name(),
        model = oracle.model_name(),
        "Built qualitative oracle"
    );
    Ok(oracle)
}
