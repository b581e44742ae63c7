use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub llm: LLMConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub chat_rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Directory (or single file) of plan JSON, read fresh on every request
    pub path: PathBuf,
    /// Optional JSON file overriding the ranker keyword tables
    pub ranker_config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub model: String,
    pub base_url: Option<String>,
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl LLMConfig {
    /// API key for the configured provider, if one is set.
    pub fn active_api_key(&self) -> Option<String> {
        let key = match self.provider {
            LLMProvider::OpenAI => &self.openai_api_key,
            LLMProvider::Anthropic => &self.anthropic_api_key,
        };
        (!key.trim().is_empty()).then(|| key.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub suggestion_limit: usize,
    pub max_history_turns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 5000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:5000".to_string(),
                ],
                chat_rate_limit_per_minute: 30,
            },
            catalog: CatalogConfig {
                path: PathBuf::from("data/plans"),
                ranker_config: None,
            },
            llm: LLMConfig {
                provider: LLMProvider::OpenAI,
                model: "gpt-4o-mini".to_string(),
                base_url: None,
                openai_api_key: String::new(),
                anthropic_api_key: String::new(),
                max_retries: 3,
                timeout_secs: 30,
            },
            assistant: AssistantConfig {
                suggestion_limit: 3,
                max_history_turns: 10,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", defaults.server.port)?,
                host: env::var("HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: match env::var("ALLOWED_ORIGINS") {
                    Ok(origins) => origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                    Err(_) => defaults.server.cors_allowed_origins,
                },
                chat_rate_limit_per_minute: parse_var(
                    "CHAT_RATE_LIMIT_PER_MINUTE",
                    defaults.server.chat_rate_limit_per_minute,
                )?,
            },
            catalog: CatalogConfig {
                path: env::var("BRIKI_CATALOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.catalog.path),
                ranker_config: env::var("BRIKI_RANKER_CONFIG").ok().map(PathBuf::from),
            },
            llm: LLMConfig {
                provider: match env::var("LLM_PROVIDER") {
                    Ok(p) => p.parse().context("LLM_PROVIDER")?,
                    Err(_) => defaults.llm.provider,
                },
                model: env::var("LLM_MODEL").unwrap_or(defaults.llm.model),
                base_url: env::var("LLM_BASE_URL").ok(),
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
                max_retries: parse_var("LLM_MAX_RETRIES", defaults.llm.max_retries)?,
                timeout_secs: parse_var("LLM_TIMEOUT_SECS", defaults.llm.timeout_secs)?,
            },
            assistant: AssistantConfig {
                suggestion_limit: parse_var(
                    "ASSISTANT_SUGGESTION_LIMIT",
                    defaults.assistant.suggestion_limit,
                )?,
                max_history_turns: parse_var(
                    "ASSISTANT_MAX_HISTORY_TURNS",
                    defaults.assistant.max_history_turns,
                )?,
            },
        })
    }
}

/// Read `name` from the environment, falling back to `default` when unset.
/// A set but malformed value is an error rather than silently ignored.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_api_key_follows_provider() {
        let mut llm = Config::default().llm;
        assert!(llm.active_api_key().is_none());

        llm.openai_api_key = "sk-test".to_string();
        assert_eq!(llm.active_api_key().as_deref(), Some("sk-test"));

        llm.provider = LLMProvider::Anthropic;
        assert!(llm.active_api_key().is_none());

        llm.anthropic_api_key = "  ".to_string();
        assert!(llm.active_api_key().is_none());
    }

    #[test]
    fn test_parse_var_default_and_error() {
        assert_eq!(parse_var("BRIKI_TEST_UNSET_VAR_0xdead", 7u32).unwrap(), 7);

        env::set_var("BRIKI_TEST_BAD_PORT", "not-a-number");
        assert!(parse_var::<u16>("BRIKI_TEST_BAD_PORT", 1).is_err());
        env::remove_var("BRIKI_TEST_BAD_PORT");

        env::set_var("BRIKI_TEST_GOOD_LIMIT", " 12 ");
        assert_eq!(parse_var::<usize>("BRIKI_TEST_GOOD_LIMIT", 3).unwrap(), 12);
        env::remove_var("BRIKI_TEST_GOOD_LIMIT");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.assistant.suggestion_limit, 3);
        assert_eq!(config.llm.max_retries, 3);
    }
}
