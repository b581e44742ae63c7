//! Keyword tables and weights owned by the ranker.
//!
//! Everything here is plain data: the ranker normalizes and compiles it once at
//! construction, so alternate tables can be swapped in without touching global state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::InsuranceCategory;
use crate::types::{AppError, AppResult};

/// A named group of query keywords that a plan confirms through its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFamily {
    pub name: String,
    pub query_keywords: Vec<String>,
    pub tag_keywords: Vec<String>,
}

impl KeywordFamily {
    pub fn new(name: &str, query_keywords: &[&str], tag_keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            query_keywords: to_strings(query_keywords),
            tag_keywords: to_strings(tag_keywords),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub category: f64,
    pub attribute_tagged: f64,
    pub attribute_untagged: f64,
    pub vehicle_tagged: f64,
    pub vehicle_untagged: f64,
    pub name_word: f64,
    pub description_word: f64,
    pub feature_word: f64,
    pub price_bonus: f64,
    pub premium_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 30.0,
            attribute_tagged: 2.0,
            attribute_untagged: 1.0,
            vehicle_tagged: 3.0,
            vehicle_untagged: 1.0,
            name_word: 2.0,
            description_word: 1.0,
            feature_word: 0.5,
            price_bonus: 15.0,
            premium_bonus: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub category_keywords: BTreeMap<InsuranceCategory, Vec<String>>,
    pub attribute_families: Vec<KeywordFamily>,
    /// Only scored for `auto` plans; the family name is the subtype.
    pub vehicle_subtypes: Vec<KeywordFamily>,
    pub price_keywords: Vec<String>,
    pub price_tags: Vec<String>,
    pub premium_keywords: Vec<String>,
    pub premium_tags: Vec<String>,
    pub greeting_words: Vec<String>,
    /// Greetings shorter than this (in characters, after normalization) never trigger suggestions.
    pub greeting_max_len: usize,
    /// Regular expressions matched against the normalized message.
    pub intent_patterns: Vec<String>,
    /// Query words shorter than this are ignored for name/description/feature matching.
    pub min_word_len: usize,
    pub weights: ScoringWeights,
}

impl RankerConfig {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read ranker config {}: {e}", path.display()))
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> AppResult<Self> {
        serde_json::from_str(data)
            .map_err(|e| AppError::Config(format!("Invalid ranker config: {e}")))
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        let mut category_keywords = BTreeMap::new();
        category_keywords.insert(
            InsuranceCategory::Travel,
            to_strings(&[
                "viaje", "viajar", "viajero", "vacaciones", "turismo", "vuelo", "extranjero",
                "internacional", "equipaje", "travel", "trip",
            ]),
        );
        category_keywords.insert(
            InsuranceCategory::Auto,
            to_strings(&[
                "auto", "carro", "coche", "vehiculo", "moto", "camioneta", "conducir", "manejar",
                "soat", "placa",
            ]),
        );
        category_keywords.insert(
            InsuranceCategory::Pet,
            to_strings(&[
                "mascota", "perro", "perrito", "gato", "gatito", "veterinari", "cachorro",
                "canino", "felino",
            ]),
        );
        category_keywords.insert(
            InsuranceCategory::Health,
            to_strings(&[
                "salud", "medico", "hospital", "clinica", "enfermedad", "doctor", "medicina",
                "cirugia", "health",
            ]),
        );

        Self {
            category_keywords,
            attribute_families: vec![
                KeywordFamily::new(
                    "economico",
                    &["economico", "economica", "barato", "barata", "accesible", "bajo costo"],
                    &["economico", "basico", "barato"],
                ),
                KeywordFamily::new(
                    "premium",
                    &["premium", "completo", "completa", "superior", "exclusivo"],
                    &["premium", "completo"],
                ),
                KeywordFamily::new(
                    "familiar",
                    &["familia", "familiar", "hijos", "pareja"],
                    &["familiar", "familia"],
                ),
                KeywordFamily::new(
                    "sin deducible",
                    &["sin deducible", "deducible cero"],
                    &["sin deducible"],
                ),
                KeywordFamily::new(
                    "asistencia",
                    &["24/7", "asistencia", "emergencia", "urgencia"],
                    &["24/7", "asistencia"],
                ),
                KeywordFamily::new(
                    "internacional",
                    &["internacional", "mundial", "exterior"],
                    &["internacional", "mundial"],
                ),
            ],
            vehicle_subtypes: vec![
                KeywordFamily::new("moto", &["moto", "motocicleta"], &["moto"]),
                KeywordFamily::new(
                    "carro",
                    &["carro", "automovil", "coche", "sedan"],
                    &["carro", "automovil"],
                ),
                KeywordFamily::new(
                    "camioneta",
                    &["camioneta", "suv", "pickup"],
                    &["camioneta", "suv"],
                ),
                KeywordFamily::new(
                    "comercial",
                    &["comercial", "taxi", "camion", "flota", "carga"],
                    &["comercial"],
                ),
            ],
            price_keywords: to_strings(&["barato", "economico", "precio"]),
            price_tags: to_strings(&["economico"]),
            premium_keywords: to_strings(&["completo", "premium", "mejor"]),
            premium_tags: to_strings(&["premium", "completo"]),
            greeting_words: to_strings(&[
                "hola", "hello", "hi", "hey", "buenas", "buenos dias", "buenas tardes",
                "buenas noches", "saludos", "que tal",
            ]),
            greeting_max_len: 20,
            intent_patterns: to_strings(&[
                r"\b(necesito|busco|quiero|requiero|me interesa|estoy buscando)\b.*\b(seguros?|proteccion|cobertura|planes|plan|polizas?|asistencia)\b",
                r"\b(need|looking for|want)\b.*\b(insurance|coverage|plan|policy)\b",
                r"\b(tengo|compre|acabo de comprar|voy a comprar|adopte)\b.*\b(carros?|autos?|coches?|motos?|camionetas?|vehiculos?|perros?|perritos?|gatos?|mascotas?|viajes?|vuelos?)\b",
                r"\b(voy a|vamos a|planeo|quiero)\s+viajar\b",
                r"\b(cuanto cuesta|cuanto vale|precios?|cotizar|cotizacion|tarifas?|how much|price|quote)\b",
                r"\b(comparar|compara|comparacion|diferencia entre|cual es mejor|mejor opcion|versus|vs|compare)\b",
            ]),
            min_word_len: 4,
            weights: ScoringWeights::default(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_every_category() {
        let config = RankerConfig::default();
        for category in InsuranceCategory::ALL {
            assert!(
                config.category_keywords.get(&category).is_some_and(|k| !k.is_empty()),
                "missing keywords for {category}"
            );
        }
    }

    #[test]
    fn test_signal_importance_ordering() {
        let w = ScoringWeights::default();
        assert!(w.category > w.attribute_tagged);
        assert!(w.attribute_tagged > w.attribute_untagged);
        assert!(w.name_word > w.description_word);
        assert!(w.description_word > w.feature_word);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RankerConfig::from_json(r#"{ "greeting_max_len": 12, "weights": { "category": 50.0 } }"#)
            .unwrap();
        assert_eq!(config.greeting_max_len, 12);
        assert_eq!(config.weights.category, 50.0);
        assert_eq!(config.weights.price_bonus, 15.0);
        assert_eq!(config.intent_patterns, RankerConfig::default().intent_patterns);
    }

    #[test]
    fn test_category_keys_round_trip_as_strings() {
        let json = serde_json::to_value(RankerConfig::default()).unwrap();
        assert!(json["category_keywords"]["travel"].is_array());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            RankerConfig::from_json("{ not json"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranker.json");
        std::fs::write(&path, r#"{ "min_word_len": 5 }"#).unwrap();
        assert_eq!(RankerConfig::from_file(&path).unwrap().min_word_len, 5);
        assert!(RankerConfig::from_file(&dir.path().join("missing.json")).is_err());
    }
}
