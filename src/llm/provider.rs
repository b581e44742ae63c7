use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::llm::anthropic::AnthropicAdapter;
use crate::llm::openai::OpenAIAdapter;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    /// Overrides the provider's public endpoint (proxies, local gateways, tests)
    pub base_url: Option<String>,
    pub timeout: Duration,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider: LLMProvider,
}

impl LLM {
    pub fn new(config: LLMProviderConfig) -> AppResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Config(format!(
                "No API key configured for {}",
                config.provider
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        let adapter: Box<dyn LLMAdapter> = match config.provider {
            LLMProvider::OpenAI => Box::new(OpenAIAdapter::new(
                client,
                &config.api_key,
                config.base_url.as_deref(),
            )),
            LLMProvider::Anthropic => Box::new(AnthropicAdapter::new(
                client,
                &config.api_key,
                config.base_url.as_deref(),
            )),
        };

        Ok(Self {
            adapter,
            provider: config.provider,
        })
    }

    /// Wrap an arbitrary adapter (used for alternate backends and tests).
    pub fn with_adapter(provider: LLMProvider, adapter: Box<dyn LLMAdapter>) -> Self {
        Self { adapter, provider }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
