//! Integration tests for the plan ranker.
//!
//! Exercises the public ranking surface against small hand-built catalogs and
//! the sample catalog shipped in `data/plans`.

use briki::catalog::{JsonPlanSource, PlanSource};
use briki::models::{InsuranceCategory, InsurancePlan};
use briki::ranker::filter_by_country;
use briki::{PlanRanker, RankerConfig};

fn ranker() -> PlanRanker {
    PlanRanker::new(RankerConfig::default()).unwrap()
}

/// Helper: a plan with no description, features or tags.
fn bare_plan(id: &str, category: InsuranceCategory, name: &str) -> InsurancePlan {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "category": category,
        "provider": "Aseguradora",
        "name": name,
        "basePrice": 50000
    }))
    .unwrap()
}

fn tagged_plan(id: &str, category: InsuranceCategory, name: &str, tags: &[&str]) -> InsurancePlan {
    let mut plan = bare_plan(id, category, name);
    plan.tags = tags.iter().map(|t| t.to_string()).collect();
    plan
}

/// Helper: a mixed catalog where several plans tie.
fn mixed_catalog() -> Vec<InsurancePlan> {
    vec![
        tagged_plan("t1", InsuranceCategory::Travel, "Viaje Uno", &["económico"]),
        tagged_plan("a1", InsuranceCategory::Auto, "Auto Uno", &["carro"]),
        tagged_plan("t2", InsuranceCategory::Travel, "Viaje Dos", &[]),
        tagged_plan("p1", InsuranceCategory::Pet, "Mascota Uno", &["premium"]),
        tagged_plan("t3", InsuranceCategory::Travel, "Viaje Tres", &[]),
        tagged_plan("h1", InsuranceCategory::Health, "Salud Uno", &["familiar"]),
    ]
}

fn ids(plans: &[&InsurancePlan]) -> Vec<String> {
    plans.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn test_ranking_is_deterministic() {
    let r = ranker();
    let catalog = mixed_catalog();
    let query = "quiero un viaje económico con mi carro";

    let first = ids(&r.rank_plans(query, &catalog, 6));
    for _ in 0..10 {
        assert_eq!(ids(&r.rank_plans(query, &catalog, 6)), first);
    }
}

#[test]
fn test_no_non_positive_scores_returned() {
    let r = ranker();
    let catalog = mixed_catalog();

    for query in ["viaje", "mi perro", "algo barato", "salud familiar", "nada relevante"] {
        for scored in r.scored_plans(query, &catalog, 10) {
            assert!(scored.score > 0.0, "{query}: {} scored {}", scored.plan.id, scored.score);
            assert_eq!(r.score(query, scored.plan), scored.score);
        }
    }
    assert!(r.rank_plans("nada relevante", &catalog, 10).is_empty());
}

#[test]
fn test_limit_respected() {
    let r = ranker();
    let catalog = mixed_catalog();
    let positive = catalog.iter().filter(|p| r.score("viaje", p) > 0.0).count();
    assert_eq!(positive, 3);

    for limit in 0..6 {
        let ranked = r.rank_plans("viaje", &catalog, limit);
        assert!(ranked.len() <= limit.min(positive));
    }
}

#[test]
fn test_equal_scores_keep_input_order() {
    let r = ranker();
    let catalog = mixed_catalog();

    // all three travel plans score category + name; the tag on t1 adds nothing
    let ranked = r.rank_plans("viaje", &catalog, 10);
    assert_eq!(ids(&ranked), vec!["t1", "t2", "t3"]);

    let mut reversed = catalog.clone();
    reversed.reverse();
    let ranked = r.rank_plans("viaje", &reversed, 10);
    assert_eq!(ids(&ranked), vec!["t3", "t2", "t1"]);
}

#[test]
fn test_intent_ignores_diacritics_and_case() {
    let r = ranker();
    let variants = [
        "Necesito un seguro",
        "necesito un seguro",
        "NECESITO UN SEGURO",
        "Nécesito un segúro",
    ];
    for v in variants {
        assert!(r.should_suggest_plans(v), "{v}");
    }

    assert_eq!(
        r.should_suggest_plans("Busco protección"),
        r.should_suggest_plans("busco proteccion")
    );
}

#[test]
fn test_greeting_suppression() {
    let r = ranker();
    assert!(!r.should_suggest_plans("hola"));
    assert!(!r.should_suggest_plans("Hola!"));
    assert!(r.should_suggest_plans("hola, necesito un seguro de auto para mi carro nuevo"));
}

#[test]
fn test_category_dominates() {
    let r = ranker();
    let travel = bare_plan("t", InsuranceCategory::Travel, "Plan Estándar");
    let auto = bare_plan("a", InsuranceCategory::Auto, "Plan Estándar");

    assert!(r.score("viaje", &travel) > r.score("viaje", &auto));
    assert_eq!(r.score("viaje", &auto), 0.0);
}

#[test]
fn test_empty_inputs_are_safe() {
    let r = ranker();
    assert!(r.rank_plans("cualquier cosa", &[], 5).is_empty());

    let plan = bare_plan("x", InsuranceCategory::Health, "Plan");
    assert!(plan.tags.is_empty());
    assert!(plan.features.is_empty());
    assert_eq!(r.score("premium barato con asistencia 24/7", &plan), 0.0);
    assert!(r.rank_plans("", std::slice::from_ref(&plan), 5).is_empty());
}

#[test]
fn test_cheap_pet_plan_scenario() {
    let r = ranker();
    let mut pet = tagged_plan("pet", InsuranceCategory::Pet, "Plan Básico Mascota", &["económico", "básico"]);
    pet.description = "Consultas y vacunas".to_string();
    let travel = tagged_plan("travel", InsuranceCategory::Travel, "Plan Viajero Plus", &["premium"]);
    let catalog = vec![pet, travel];

    let query = "Busco un seguro económico para mi perro";
    assert!(r.should_suggest_plans(query));

    let scored = r.scored_plans(query, &catalog, 3);
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].plan.name, "Plan Básico Mascota");
    // category 30 + tagged attribute 2 + price bonus 15
    assert_eq!(scored[0].score, 47.0);
    assert_eq!(r.score(query, &catalog[1]), 0.0);
}

#[test]
fn test_country_filter_then_rank() {
    let r = ranker();
    let mut co_only = bare_plan("co", InsuranceCategory::Travel, "Viaje Colombia");
    co_only.restrictions = Some(briki::models::PlanRestrictions {
        countries: Some(vec!["CO".to_string()]),
    });
    let open = bare_plan("open", InsuranceCategory::Travel, "Viaje Abierto");

    let plans = filter_by_country(vec![co_only, open], Some("MX"));
    let ranked = r.rank_plans("viaje", &plans, 5);
    assert_eq!(ids(&ranked), vec!["open"]);
}

#[tokio::test]
async fn test_sample_catalog_ranks_sensibly() {
    let plans = JsonPlanSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/plans"))
        .load_plans()
        .await
        .unwrap();
    assert!(plans.len() >= 8);

    let r = ranker();
    let ranked = r.rank_plans("Busco un seguro económico para mi perro", &plans, 3);
    assert_eq!(ranked[0].id, "pet-basic-001");
    assert_eq!(ranked[1].category, InsuranceCategory::Pet);

    let ranked = r.rank_plans("seguro para mi moto", &plans, 3);
    assert_eq!(ranked[0].id, "auto-moto-001");
}
