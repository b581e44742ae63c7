// Anthropic Messages API adapter
// The system prompt is a top-level field, not a message

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Deserialize)]
struct AnthropicError {
    message: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(ANTHROPIC_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_request<'a>(request: &'a LLMRequest) -> AnthropicRequest<'a> {
        // System turns embedded in the history are folded into the top-level field
        let system = request.system_instruction.as_deref().or_else(|| {
            request
                .messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.as_str())
        });

        AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != "system")
                .map(|m| AnthropicMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LLMAdapter for AnthropicAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(AppError::LLMApi(format!("Anthropic API error ({status}): {message}")));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Anthropic response: {e}")))?;

        let content: String = body
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        Ok(LLMResponse {
            content,
            finish_reason: body.stop_reason.unwrap_or_else(|| "end_turn".to_string()),
            usage: TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
                total_tokens: body.usage.input_tokens + body.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;

    fn request(system_instruction: Option<&str>) -> LLMRequest {
        LLMRequest {
            model: "claude-3-5-haiku-latest".to_string(),
            messages: vec![
                LLMMessage::system("from history"),
                LLMMessage::user("Hola"),
            ],
            max_tokens: None,
            temperature: None,
            system_instruction: system_instruction.map(str::to_string),
        }
    }

    #[test]
    fn test_system_messages_are_lifted() {
        let req = request(None);
        let body = serde_json::to_value(AnthropicAdapter::build_request(&req)).unwrap();
        assert_eq!(body["system"], "from history");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);

        let req = request(Some("explicit"));
        let body = serde_json::to_value(AnthropicAdapter::build_request(&req)).unwrap();
        assert_eq!(body["system"], "explicit");
    }

    #[tokio::test]
    async fn test_successful_completion_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"Hola, "},{"type":"text","text":"¿en qué te ayudo?"}],
                    "stop_reason":"end_turn","usage":{"input_tokens":5,"output_tokens":7}}"#,
            )
            .create_async()
            .await;

        let adapter = AnthropicAdapter::new(Client::new(), "ak-test", Some(&server.url()));
        let response = adapter.create_chat_completion(&request(None)).await.unwrap();

        assert_eq!(response.content, "Hola, ¿en qué te ayudo?");
        assert_eq!(response.usage.total_tokens, 12);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#)
            .create_async()
            .await;

        let adapter = AnthropicAdapter::new(Client::new(), "bad", Some(&server.url()));
        let err = adapter.create_chat_completion(&request(None)).await.unwrap_err();
        assert!(err.to_string().contains("invalid x-api-key"));
    }
}
