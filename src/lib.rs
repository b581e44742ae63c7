// Briki - insurance plan marketplace backend with a keyword-weighted plan ranker

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod ranker;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::{AppState, InsuranceCategory, InsurancePlan};
pub use ranker::{PlanRanker, RankerConfig, ScoredPlan};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
