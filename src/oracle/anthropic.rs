//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{OracleError, TextOracle};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub(super) const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;
const PROVIDER: &str = "anthropic";

/// Claude-backed oracle. One request per call, no retry.
pub struct AnthropicOracle {
    api_key: String,
    model: String,
    client: Client,
}

impl AnthropicOracle {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[async_trait]
impl TextOracle for AnthropicOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let transport = |source| OracleError::Transport {
            provider: PROVIDER,
            source,
        };

        let response = self
            .client
            .post(format!("{}/messages", ANTHROPIC_API_BASE))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let response: MessagesResponse = response.json().await.map_err(transport)?;
        let text = collect_text(response);
        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse(PROVIDER));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("")
}
