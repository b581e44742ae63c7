//! Plan catalog
//!
//! Plans are loaded fresh for every request and dropped with the response.
//! The JSON source reads either a single file or every `*.json` file in a
//! directory (sorted by file name, so catalog order is deterministic). Each
//! file holds an array of plans.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::models::{InsuranceCategory, InsurancePlan};
use crate::types::{AppError, AppResult};

#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn load_plans(&self) -> AppResult<Vec<InsurancePlan>>;

    /// Human readable description used by the health endpoint and logs.
    fn describe(&self) -> String;
}

/// Load the catalog, degrading to an empty list when the source fails.
pub async fn load_or_empty(source: &dyn PlanSource) -> Vec<InsurancePlan> {
    match source.load_plans().await {
        Ok(plans) => plans,
        Err(e) => {
            warn!(source = %source.describe(), error = %e, "Failed to load plan catalog, using empty catalog");
            Vec::new()
        }
    }
}

pub fn filter_by_category(
    plans: Vec<InsurancePlan>,
    category: Option<InsuranceCategory>,
) -> Vec<InsurancePlan> {
    match category {
        Some(category) => plans.into_iter().filter(|p| p.category == category).collect(),
        None => plans,
    }
}

pub fn find_by_id(plans: Vec<InsurancePlan>, id: &str) -> AppResult<InsurancePlan> {
    plans
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Plan {id}")))
}

/// Reads plan JSON from disk on every call.
pub struct JsonPlanSource {
    path: PathBuf,
}

impl JsonPlanSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn catalog_files(&self) -> AppResult<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        if metadata.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read_file(path: &Path) -> AppResult<Vec<InsurancePlan>> {
        let data = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&data).map_err(|e| {
            AppError::Internal(format!("Invalid plan file {}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl PlanSource for JsonPlanSource {
    async fn load_plans(&self) -> AppResult<Vec<InsurancePlan>> {
        let files = self.catalog_files().await?;
        // try_join_all preserves file order
        let per_file = try_join_all(files.iter().map(|f| Self::read_file(f))).await?;
        let plans: Vec<InsurancePlan> = per_file.into_iter().flatten().collect();
        debug!(path = %self.path.display(), plan_count = plans.len(), "Loaded plan catalog");
        Ok(plans)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

/// Fixed in-memory catalog.
pub struct StaticPlanSource {
    plans: Vec<InsurancePlan>,
}

impl StaticPlanSource {
    pub fn new(plans: Vec<InsurancePlan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl PlanSource for StaticPlanSource {
    async fn load_plans(&self) -> AppResult<Vec<InsurancePlan>> {
        Ok(self.plans.clone())
    }

    fn describe(&self) -> String {
        format!("static:{} plans", self.plans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plans_json(ids: &[(&str, &str)]) -> String {
        let plans: Vec<_> = ids
            .iter()
            .map(|(id, category)| {
                serde_json::json!({
                    "id": id,
                    "category": category,
                    "provider": "Sura",
                    "name": format!("Plan {id}"),
                    "basePrice": 1000
                })
            })
            .collect();
        serde_json::to_string(&plans).unwrap()
    }

    #[tokio::test]
    async fn test_directory_source_reads_sorted_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_pet.json"), plans_json(&[("p1", "pet")])).unwrap();
        std::fs::write(
            dir.path().join("a_travel.json"),
            plans_json(&[("t1", "travel"), ("t2", "travel")]),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let plans = JsonPlanSource::new(dir.path()).load_plans().await.unwrap();
        let ids: Vec<&str> = plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "p1"]);
    }

    #[tokio::test]
    async fn test_single_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plans.json");
        std::fs::write(&file, plans_json(&[("h1", "health")])).unwrap();

        let plans = JsonPlanSource::new(&file).load_plans().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].category, InsuranceCategory::Health);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_catalog_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = JsonPlanSource::new(dir.path().join("nope"));
        assert!(missing.load_plans().await.is_err());
        assert!(load_or_empty(&missing).await.is_empty());

        std::fs::write(dir.path().join("broken.json"), "[{").unwrap();
        let broken = JsonPlanSource::new(dir.path());
        assert!(load_or_empty(&broken).await.is_empty());
    }

    #[tokio::test]
    async fn test_category_filter_and_lookup() {
        let plans: Vec<InsurancePlan> =
            serde_json::from_str(&plans_json(&[("a1", "auto"), ("p1", "pet")])).unwrap();
        let source = StaticPlanSource::new(plans);

        let autos = filter_by_category(source.load_plans().await.unwrap(), Some(InsuranceCategory::Auto));
        assert_eq!(autos.len(), 1);
        assert_eq!(autos[0].id, "a1");

        let all = filter_by_category(source.load_plans().await.unwrap(), None);
        assert_eq!(all.len(), 2);

        assert_eq!(find_by_id(all.clone(), "p1").unwrap().id, "p1");
        assert!(matches!(find_by_id(all, "zz"), Err(AppError::NotFound(_))));
    }
}
