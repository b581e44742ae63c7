use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use validator::Validate;

use crate::assistant::Assistant;
use crate::catalog::{JsonPlanSource, PlanSource};
use crate::config::Config;
use crate::llm::LLM;
use crate::middleware::chat_rate_limiter;
use crate::ranker::{PlanRanker, RankerConfig};
use crate::types::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ranker: Arc<PlanRanker>,
    pub catalog: Arc<dyn PlanSource>,
    pub assistant: Arc<Assistant>,
    pub chat_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    /// Assemble state from explicit parts; `llm: None` makes the assistant reply with fallbacks.
    pub fn new(
        config: Config,
        catalog: Arc<dyn PlanSource>,
        ranker: PlanRanker,
        llm: Option<LLM>,
    ) -> Self {
        let ranker = Arc::new(ranker);
        let assistant = Assistant::new(ranker.clone(), llm, &config);
        let chat_limiter = chat_rate_limiter(config.server.chat_rate_limit_per_minute);

        Self {
            ranker,
            catalog,
            assistant: Arc::new(assistant),
            chat_limiter: Arc::new(chat_limiter),
            config,
        }
    }

    /// Build the production state: JSON catalog, optional ranker tables file, configured LLM.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let ranker_config = match &config.catalog.ranker_config {
            Some(path) => RankerConfig::from_file(path)?,
            None => RankerConfig::default(),
        };
        let ranker = Arc::new(PlanRanker::new(ranker_config)?);
        let catalog: Arc<dyn PlanSource> = Arc::new(JsonPlanSource::new(&config.catalog.path));
        let assistant = Assistant::from_config(ranker.clone(), &config)?;
        let chat_limiter = chat_rate_limiter(config.server.chat_rate_limit_per_minute);

        Ok(Self {
            ranker,
            catalog,
            assistant: Arc::new(assistant),
            chat_limiter: Arc::new(chat_limiter),
            config,
        })
    }
}

// Catalog models. JSON field names follow the frontend (camelCase).

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceCategory {
    Travel,
    Auto,
    Pet,
    Health,
}

impl InsuranceCategory {
    pub const ALL: [InsuranceCategory; 4] = [
        InsuranceCategory::Travel,
        InsuranceCategory::Auto,
        InsuranceCategory::Pet,
        InsuranceCategory::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceCategory::Travel => "travel",
            InsuranceCategory::Auto => "auto",
            InsuranceCategory::Pet => "pet",
            InsuranceCategory::Health => "health",
        }
    }
}

impl std::fmt::Display for InsuranceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InsuranceCategory {
    type Err = crate::types::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsuranceCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                crate::types::AppError::InvalidRequest(format!("Unknown insurance category: {s}"))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlanRestrictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurancePlan {
    pub id: String,
    pub category: InsuranceCategory,
    pub provider: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub coverage_amount: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<PlanRestrictions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_countries: Option<Vec<String>>,
}

fn default_currency() -> String {
    "COP".to_string()
}

impl InsurancePlan {
    /// Returns false only when an allow-list is present and excludes `country`.
    pub fn is_available_in(&self, country: &str) -> bool {
        let country = country.trim();
        let allows = |list: &Option<Vec<String>>| match list {
            Some(codes) => codes.iter().any(|c| c.trim().eq_ignore_ascii_case(country)),
            None => true,
        };

        self.restrictions
            .as_ref()
            .map_or(true, |r| allows(&r.countries))
            && allows(&self.available_countries)
    }
}

// API Request/Response types

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "message must be 1-2000 characters"))]
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    #[validate(length(min = 2, max = 3, message = "country must be an ISO code"))]
    pub country: Option<String>,
}

/// A single chat turn (user or assistant)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat response format matching frontend expectations:
/// `{ message, suggestedPlans, messageId }`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub suggested_plans: Vec<InsurancePlan>,
    pub message_id: uuid::Uuid,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    pub country: Option<String>,
    pub category: Option<InsuranceCategory>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlanListParams {
    pub category: Option<InsuranceCategory>,
    pub country: Option<String>,
}

/// A plan flattened together with its relevance score.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankedPlanView {
    #[serde(flatten)]
    pub plan: InsurancePlan,
    pub score: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<RankedPlanView>,
    pub total: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub catalog: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_json() -> serde_json::Value {
        serde_json::json!({
            "id": "pet-1",
            "category": "pet",
            "provider": "Sura",
            "name": "Plan Básico Mascota",
            "basePrice": 25000.0
        })
    }

    #[test]
    fn test_plan_missing_optional_fields_deserializes() {
        let plan: InsurancePlan = serde_json::from_value(plan_json()).unwrap();
        assert!(plan.tags.is_empty());
        assert!(plan.features.is_empty());
        assert_eq!(plan.description, "");
        assert_eq!(plan.currency, "COP");
        assert!(plan.restrictions.is_none());
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let plan: InsurancePlan = serde_json::from_value(plan_json()).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["basePrice"], 25000.0);
        assert_eq!(json["category"], "pet");
        assert!(json.get("availableCountries").is_none());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Travel".parse::<InsuranceCategory>().unwrap(), InsuranceCategory::Travel);
        assert!("home".parse::<InsuranceCategory>().is_err());
    }

    #[test]
    fn test_availability_allow_lists() {
        let mut plan: InsurancePlan = serde_json::from_value(plan_json()).unwrap();
        assert!(plan.is_available_in("CO"));

        plan.restrictions = Some(PlanRestrictions {
            countries: Some(vec!["CO".into(), "MX".into()]),
        });
        assert!(plan.is_available_in("co"));
        assert!(!plan.is_available_in("PE"));

        plan.restrictions = Some(PlanRestrictions::default());
        plan.available_countries = Some(vec!["PE".into()]);
        assert!(plan.is_available_in("PE"));
        assert!(!plan.is_available_in("CO"));
    }

    #[test]
    fn test_chat_request_validation() {
        let ok = ChatRequest {
            message: "necesito un seguro".into(),
            history: None,
            country: Some("CO".into()),
        };
        assert!(ok.validate().is_ok());

        let empty = ChatRequest {
            message: String::new(),
            history: None,
            country: None,
        };
        assert!(empty.validate().is_err());
    }
}
