use regex::Regex;

use crate::ranker::config::RankerConfig;
use crate::ranker::normalize::normalize;
use crate::types::{AppError, AppResult};

/// Decides whether a user message expresses insurance-shopping intent.
///
/// Rule order: empty → no; short greeting → no; any intent pattern → yes; otherwise no.
#[derive(Debug, Clone)]
pub struct IntentDetector {
    greeting: Option<Regex>,
    greeting_max_len: usize,
    patterns: Vec<Regex>,
}

impl IntentDetector {
    pub fn new(config: &RankerConfig) -> AppResult<Self> {
        let greeting_words: Vec<String> = config
            .greeting_words
            .iter()
            .map(|w| normalize(w))
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect();

        let greeting = if greeting_words.is_empty() {
            None
        } else {
            Some(compile(&format!(r"^(?:{})\b", greeting_words.join("|")))?)
        };

        let patterns = config
            .intent_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            greeting,
            greeting_max_len: config.greeting_max_len,
            patterns,
        })
    }

    pub fn should_suggest_plans(&self, message: &str) -> bool {
        let normalized = normalize(message);
        if normalized.is_empty() || self.is_short_greeting(&normalized) {
            return false;
        }
        self.patterns.iter().any(|p| p.is_match(&normalized))
    }

    fn is_short_greeting(&self, normalized: &str) -> bool {
        normalized.chars().count() < self.greeting_max_len
            && self.greeting.as_ref().is_some_and(|g| g.is_match(normalized))
    }
}

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| AppError::Config(format!("Invalid intent pattern '{pattern}': {e}")))
}
