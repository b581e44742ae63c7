//! Assistant
//!
//! Answers chat messages about insurance and decides whether to attach plan
//! suggestions:
//!
//! ```text
//! User Message
//!      │
//!      ├──► should_suggest_plans? ──yes──► country filter ──► rank_plans (top N)
//!      │                                                          │
//!      ▼                                                          ▼
//! ┌─────────────┐   retry w/ backoff   ┌─────────┐       suggested plans
//! │  Prompt     │ ───────────────────► │   LLM   │ ──┐          │
//! └─────────────┘                      └─────────┘   │          │
//!        no key / failure ──► fallback reply ────────┤          │
//!                                                    ▼          ▼
//!                                       { message, suggestedPlans }
//! ```

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::llm::provider::{LLMProviderConfig, LLM};
use crate::models::{ChatMessage, ChatRequest, ChatResponse, InsurancePlan};
use crate::ranker::{filter_by_country, PlanRanker};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use crate::utils::retry::{with_retry, RetryPolicy};

const MAX_MESSAGE_CHARS: usize = 2000;
const MAX_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.7;

pub struct Assistant {
    ranker: Arc<PlanRanker>,
    llm: Option<LLM>,
    model: String,
    retry: RetryPolicy,
    suggestion_limit: usize,
    max_history_turns: usize,
}

impl Assistant {
    pub fn new(ranker: Arc<PlanRanker>, llm: Option<LLM>, config: &Config) -> Self {
        Self {
            ranker,
            llm,
            model: config.llm.model.clone(),
            retry: RetryPolicy {
                max_attempts: config.llm.max_retries,
                ..RetryPolicy::default()
            },
            suggestion_limit: config.assistant.suggestion_limit,
            max_history_turns: config.assistant.max_history_turns,
        }
    }

    /// Build the assistant with the configured provider, or without an LLM
    /// (fallback replies only) when no API key is set.
    pub fn from_config(ranker: Arc<PlanRanker>, config: &Config) -> AppResult<Self> {
        let llm = match config.llm.active_api_key() {
            Some(api_key) => Some(LLM::new(LLMProviderConfig {
                provider: config.llm.provider,
                api_key,
                base_url: config.llm.base_url.clone(),
                timeout: Duration::from_secs(config.llm.timeout_secs),
            })?),
            None => {
                warn!(provider = %config.llm.provider, "No LLM API key configured, assistant will use fallback replies");
                None
            }
        };
        Ok(Self::new(ranker, llm, config))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Plans to attach to a reply for `message`; empty when the message shows no shopping intent.
    pub fn suggest_plans(
        &self,
        message: &str,
        plans: Vec<InsurancePlan>,
        country: Option<&str>,
    ) -> Vec<InsurancePlan> {
        if !self.ranker.should_suggest_plans(message) {
            return Vec::new();
        }
        let plans = filter_by_country(plans, country);
        self.ranker
            .rank_plans(message, &plans, self.suggestion_limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn reply(
        &self,
        request: ChatRequest,
        plans: Vec<InsurancePlan>,
    ) -> AppResult<ChatResponse> {
        let message = truncate_chars(request.message.trim(), MAX_MESSAGE_CHARS);
        if message.is_empty() {
            return Err(AppError::InvalidRequest("Message is required".to_string()));
        }

        let history = sanitize_history(request.history, self.max_history_turns);
        let catalog_size = plans.len();
        let suggested_plans = self.suggest_plans(&message, plans, request.country.as_deref());

        info!(
            message_len = message.len(),
            history_turns = history.len(),
            catalog_size,
            suggested = suggested_plans.len(),
            "Generating assistant reply"
        );

        let text = match &self.llm {
            Some(llm) => {
                let llm_request = LLMRequest {
                    model: self.model.clone(),
                    messages: build_messages(&history, &message),
                    max_tokens: Some(MAX_TOKENS),
                    temperature: Some(TEMPERATURE),
                    system_instruction: Some(build_system_prompt(&suggested_plans)),
                };
                let llm_request = &llm_request;

                match with_retry(self.retry, move || llm.create_chat_completion(llm_request)).await {
                    Ok(response) if !response.content.trim().is_empty() => {
                        info!(
                            provider = %llm.provider(),
                            response_len = response.content.len(),
                            total_tokens = response.usage.total_tokens,
                            "LLM reply generated"
                        );
                        response.content
                    }
                    Ok(_) => {
                        warn!("LLM returned an empty reply, using fallback");
                        fallback_reply(&suggested_plans)
                    }
                    Err(e) => {
                        error!(error = %e, "LLM call failed, using fallback reply");
                        fallback_reply(&suggested_plans)
                    }
                }
            }
            None => fallback_reply(&suggested_plans),
        };

        Ok(ChatResponse {
            message: text,
            suggested_plans,
            message_id: uuid::Uuid::new_v4(),
        })
    }
}

fn build_system_prompt(suggested: &[InsurancePlan]) -> String {
    let mut prompt = String::from(
        "Eres el asistente virtual de Briki, un comparador de seguros de viaje, auto, \
         mascotas y salud en Latinoamérica.\n\
         Responde siempre en el idioma del usuario, de forma breve, clara y amable.\n\
         No inventes precios ni coberturas: usa solo la información de los planes listados.\n\
         Si el usuario no ha indicado qué necesita, haz una pregunta para entenderlo mejor.\n",
    );

    if !suggested.is_empty() {
        prompt.push_str("\nPlanes que se mostrarán al usuario junto a tu respuesta:\n");
        for plan in suggested {
            // Writing to a String cannot fail
            let _ = writeln!(
                prompt,
                "- {} ({}, {}): {} {} {}. {}",
                plan.name,
                plan.provider,
                plan.category,
                plan.base_price,
                plan.currency,
                plan.duration,
                plan.features.join(", ")
            );
        }
        prompt.push_str("Menciona brevemente por qué estos planes encajan con lo que pidió.\n");
    }

    prompt
}

fn build_messages(history: &[ChatMessage], message: &str) -> Vec<LLMMessage> {
    let mut messages: Vec<LLMMessage> = history
        .iter()
        .map(|m| LLMMessage::new(m.role.clone(), m.content.clone()))
        .collect();
    messages.push(LLMMessage::user(message));
    messages
}

/// Keep the last `max_turns` user/assistant turns; other roles are dropped.
fn sanitize_history(history: Option<Vec<ChatMessage>>, max_turns: usize) -> Vec<ChatMessage> {
    let turns: Vec<ChatMessage> = history
        .unwrap_or_default()
        .into_iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| ChatMessage {
            content: truncate_chars(&m.content, MAX_MESSAGE_CHARS),
            role: m.role,
        })
        .collect();

    let skip = turns.len().saturating_sub(max_turns);
    turns.into_iter().skip(skip).collect()
}

fn fallback_reply(suggested: &[InsurancePlan]) -> String {
    if suggested.is_empty() {
        return "¡Hola! Soy el asistente de Briki. Puedo ayudarte a comparar seguros de viaje, \
                auto, mascotas y salud. Cuéntame qué quieres proteger y te muestro las mejores opciones."
            .to_string();
    }

    let mut reply = String::from("Estos planes podrían interesarte:\n");
    for plan in suggested {
        let _ = writeln!(
            reply,
            "- {} de {} desde {} {}",
            plan.name, plan.provider, plan.base_price, plan.currency
        );
    }
    reply.push_str("¿Quieres que te ayude a compararlos?");
    reply
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
