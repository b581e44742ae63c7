//! Plan Relevance Ranker
//!
//! Scores a catalog of insurance plans against a free-text query and returns the
//! most relevant ones. Scoring is an additive sum of independent keyword signals:
//!
//! ```text
//!   query ──► normalize (NFD, strip marks, lowercase)
//!                │
//!                ├─ category keywords      +30
//!                ├─ attribute families     +2 per keyword (tagged) / +1 (category match only)
//!                ├─ vehicle subtypes       +3 per keyword (tagged) / +1   [auto only]
//!                ├─ name / description     +2 / +1 per query word
//!                ├─ features               +0.5 per query word per feature
//!                └─ price / premium bonus  +15 / +10
//!                │
//!                ▼
//!   drop score <= 0 ─► stable sort desc ─► take limit
//! ```
//!
//! Matching is plain substring containment on normalized text. The ranker is
//! pure: it borrows plans, never mutates them, and holds no mutable state.

pub mod config;
pub mod intent;
pub mod normalize;

pub use config::{KeywordFamily, RankerConfig, ScoringWeights};
pub use intent::IntentDetector;
pub use normalize::normalize;

use crate::models::{InsuranceCategory, InsurancePlan};
use crate::types::AppResult;
use normalize::query_words;

/// A plan paired with its relevance score for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlan<'a> {
    pub plan: &'a InsurancePlan,
    pub score: f64,
}

/// Keyword tables after normalization and deduplication.
#[derive(Debug, Clone)]
struct KeywordTables {
    categories: Vec<(InsuranceCategory, Vec<String>)>,
    attributes: Vec<NormalizedFamily>,
    vehicles: Vec<NormalizedFamily>,
    price_keywords: Vec<String>,
    price_tags: Vec<String>,
    premium_keywords: Vec<String>,
    premium_tags: Vec<String>,
}

#[derive(Debug, Clone)]
struct NormalizedFamily {
    query_keywords: Vec<String>,
    tag_keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PlanRanker {
    tables: KeywordTables,
    intent: IntentDetector,
    weights: ScoringWeights,
    min_word_len: usize,
}

impl PlanRanker {
    /// Build a ranker from a keyword configuration.
    ///
    /// Fails only if one of the configured intent patterns is not a valid regex.
    pub fn new(config: RankerConfig) -> AppResult<Self> {
        let intent = IntentDetector::new(&config)?;

        let family = |f: &KeywordFamily| NormalizedFamily {
            query_keywords: normalize_all(&f.query_keywords),
            tag_keywords: normalize_all(&f.tag_keywords),
        };

        let tables = KeywordTables {
            categories: config
                .category_keywords
                .iter()
                .map(|(category, keywords)| (*category, normalize_all(keywords)))
                .collect(),
            attributes: config.attribute_families.iter().map(family).collect(),
            vehicles: config.vehicle_subtypes.iter().map(family).collect(),
            price_keywords: normalize_all(&config.price_keywords),
            price_tags: normalize_all(&config.price_tags),
            premium_keywords: normalize_all(&config.premium_keywords),
            premium_tags: normalize_all(&config.premium_tags),
        };

        Ok(Self {
            tables,
            intent,
            weights: config.weights,
            min_word_len: config.min_word_len,
        })
    }

    /// Whether `message` warrants attaching plan suggestions to a reply.
    pub fn should_suggest_plans(&self, message: &str) -> bool {
        self.intent.should_suggest_plans(message)
    }

    /// Top `limit` plans by descending relevance; plans scoring <= 0 are excluded.
    pub fn rank_plans<'a>(
        &self,
        query: &str,
        plans: &'a [InsurancePlan],
        limit: usize,
    ) -> Vec<&'a InsurancePlan> {
        self.scored_plans(query, plans, limit)
            .into_iter()
            .map(|scored| scored.plan)
            .collect()
    }

    /// Same as [`PlanRanker::rank_plans`] but keeps the scores.
    pub fn scored_plans<'a>(
        &self,
        query: &str,
        plans: &'a [InsurancePlan],
        limit: usize,
    ) -> Vec<ScoredPlan<'a>> {
        if limit == 0 || plans.is_empty() {
            return Vec::new();
        }

        let query = normalize(query);
        let words = query_words(&query, self.min_word_len);

        let mut scored: Vec<ScoredPlan<'a>> = plans
            .iter()
            .map(|plan| ScoredPlan {
                plan,
                score: self.score_normalized(&query, &words, plan),
            })
            .filter(|scored| scored.score > 0.0)
            .collect();

        // sort_by is stable: equal scores keep catalog order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);

        tracing::debug!(
            query_len = query.len(),
            candidates = plans.len(),
            returned = scored.len(),
            "Ranked plans"
        );
        scored
    }

    /// Relevance score of a single plan for `query`.
    pub fn score(&self, query: &str, plan: &InsurancePlan) -> f64 {
        let query = normalize(query);
        let words = query_words(&query, self.min_word_len);
        self.score_normalized(&query, &words, plan)
    }

    fn score_normalized(&self, query: &str, words: &[&str], plan: &InsurancePlan) -> f64 {
        let w = &self.weights;
        let tags = normalize_all(&plan.tags);
        let mut score = 0.0;

        let category_match = self.category_matches(query, plan.category);
        if category_match {
            score += w.category;
        }

        for family in &self.tables.attributes {
            let hits = count_hits(query, &family.query_keywords) as f64;
            if hits == 0.0 {
                continue;
            }
            if has_tag(&tags, &family.tag_keywords) {
                score += hits * w.attribute_tagged;
            } else if category_match {
                score += hits * w.attribute_untagged;
            }
        }

        if plan.category == InsuranceCategory::Auto {
            for subtype in &self.tables.vehicles {
                let hits = count_hits(query, &subtype.query_keywords) as f64;
                if hits == 0.0 {
                    continue;
                }
                score += if has_tag(&tags, &subtype.tag_keywords) {
                    hits * w.vehicle_tagged
                } else {
                    hits * w.vehicle_untagged
                };
            }
        }

        if !words.is_empty() {
            let name = normalize(&plan.name);
            let description = normalize(&plan.description);
            let features: Vec<String> = plan.features.iter().map(|f| normalize(f)).collect();

            for word in words {
                if name.contains(word) {
                    score += w.name_word;
                }
                if description.contains(word) {
                    score += w.description_word;
                }
                let feature_hits = features.iter().filter(|f| f.contains(word)).count();
                score += feature_hits as f64 * w.feature_word;
            }
        }

        if contains_any(query, &self.tables.price_keywords)
            && has_tag(&tags, &self.tables.price_tags)
        {
            score += w.price_bonus;
        }
        if contains_any(query, &self.tables.premium_keywords)
            && has_tag(&tags, &self.tables.premium_tags)
        {
            score += w.premium_bonus;
        }

        score
    }

    fn category_matches(&self, query: &str, category: InsuranceCategory) -> bool {
        self.tables
            .categories
            .iter()
            .find(|(c, _)| *c == category)
            .is_some_and(|(_, keywords)| contains_any(query, keywords))
    }
}

/// Drop plans whose country allow-list excludes `country`. Plans without an
/// allow-list are always kept; `None` keeps everything.
pub fn filter_by_country(plans: Vec<InsurancePlan>, country: Option<&str>) -> Vec<InsurancePlan> {
    match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => plans
            .into_iter()
            .filter(|plan| plan.is_available_in(code))
            .collect(),
        None => plans,
    }
}

fn normalize_all(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = normalize(value);
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

fn count_hits(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}

fn has_tag(tags: &[String], keywords: &[String]) -> bool {
    tags.iter()
        .any(|tag| keywords.iter().any(|k| tag == k || tag.contains(k.as_str())))
}
