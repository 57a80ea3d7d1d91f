//! Persistence seam for the Template Store.
//!
//! `TemplateStore` serialises writes per template id before calling into a
//! repository, so implementations only need each call to be atomic on its own.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::template::{PerformanceRecord, Template, TemplateAggregates, TemplateVersion};

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Inserts the template and its version 1. Returns `false` (and writes
    /// nothing) when a template with the same id already exists.
    async fn insert_template(&self, template: &Template, content: &str, notes: &str) -> Result<bool, AppError>;

    async fn get_template(&self, id: &str) -> Result<Option<Template>, AppError>;

    /// Ordered by id.
    async fn list_templates(&self, kind: Option<DocumentKind>) -> Result<Vec<Template>, AppError>;

    async fn latest_version(&self, id: &str) -> Result<Option<TemplateVersion>, AppError>;

    /// Ascending by version number.
    async fn versions(&self, id: &str) -> Result<Vec<TemplateVersion>, AppError>;

    /// Appends content as version `max(existing) + 1`.
    async fn append_version(
        &self,
        id: &str,
        content: &str,
        performance_score: Option<f64>,
        notes: &str,
    ) -> Result<TemplateVersion, AppError>;

    /// Deletes all but the newest `keep` versions. Returns how many were removed.
    async fn prune_versions(&self, id: &str, keep: usize) -> Result<u64, AppError>;

    async fn append_performance(&self, record: &PerformanceRecord) -> Result<(), AppError>;

    /// Oldest first.
    async fn performance_records(&self, id: &str) -> Result<Vec<PerformanceRecord>, AppError>;

    async fn write_aggregates(&self, id: &str, aggregates: &TemplateAggregates) -> Result<(), AppError>;

    /// Returns `false` when the template does not exist.
    async fn set_active(&self, id: &str, active: bool) -> Result<bool, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    templates: BTreeMap<String, Template>,
    versions: HashMap<String, Vec<TemplateVersion>>,
    performance: HashMap<String, Vec<PerformanceRecord>>,
    /// Highest version ever assigned, so pruning never causes reuse.
    max_version: HashMap<String, i32>,
}

/// Process-local repository. Used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryTemplateRepository {
    tables: RwLock<Tables>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Template {id} not found"))
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn insert_template(&self, template: &Template, content: &str, notes: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.templates.contains_key(&template.id) {
            return Ok(false);
        }
        tables.templates.insert(template.id.clone(), template.clone());
        tables.versions.insert(
            template.id.clone(),
            vec![TemplateVersion {
                template_id: template.id.clone(),
                version: 1,
                content: content.to_string(),
                performance_score: None,
                notes: notes.to_string(),
                created_at: template.created_at,
            }],
        );
        tables.max_version.insert(template.id.clone(), 1);
        Ok(true)
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, AppError> {
        Ok(self.tables.read().await.templates.get(id).cloned())
    }

    async fn list_templates(&self, kind: Option<DocumentKind>) -> Result<Vec<Template>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .templates
            .values()
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .cloned()
            .collect())
    }

    async fn latest_version(&self, id: &str) -> Result<Option<TemplateVersion>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .get(id)
            .and_then(|v| v.iter().max_by_key(|v| v.version))
            .cloned())
    }

    async fn versions(&self, id: &str) -> Result<Vec<TemplateVersion>, AppError> {
        let tables = self.tables.read().await;
        let mut versions = tables.versions.get(id).cloned().unwrap_or_default();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn append_version(
        &self,
        id: &str,
        content: &str,
        performance_score: Option<f64>,
        notes: &str,
    ) -> Result<TemplateVersion, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.templates.contains_key(id) {
            return Err(not_found(id));
        }
        let next = tables.max_version.get(id).copied().unwrap_or(0) + 1;
        let version = TemplateVersion {
            template_id: id.to_string(),
            version: next,
            content: content.to_string(),
            performance_score,
            notes: notes.to_string(),
            created_at: Utc::now(),
        };
        tables.max_version.insert(id.to_string(), next);
        tables
            .versions
            .entry(id.to_string())
            .or_default()
            .push(version.clone());
        Ok(version)
    }

    async fn prune_versions(&self, id: &str, keep: usize) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let Some(versions) = tables.versions.get_mut(id) else {
            return Ok(0);
        };
        if versions.len() <= keep {
            return Ok(0);
        }
        versions.sort_by_key(|v| v.version);
        let removed = versions.len() - keep;
        versions.drain(..removed);
        Ok(removed as u64)
    }

    async fn append_performance(&self, record: &PerformanceRecord) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.templates.contains_key(&record.template_id) {
            return Err(not_found(&record.template_id));
        }
        tables
            .performance
            .entry(record.template_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn performance_records(&self, id: &str) -> Result<Vec<PerformanceRecord>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .performance
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn write_aggregates(&self, id: &str, aggregates: &TemplateAggregates) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let template = tables.templates.get_mut(id).ok_or_else(|| not_found(id))?;
        template.usage_count = aggregates.usage_count;
        template.success_rate = aggregates.success_rate;
        template.average_score = aggregates.average_score;
        template.last_used = aggregates.last_used;
        Ok(())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.templates.get_mut(id) {
            Some(template) => {
                template.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(content: &str) -> Template {
        Template::new(DocumentKind::Cv, "Backend", content, vec!["rust".into()], vec![])
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let repo = InMemoryTemplateRepository::new();
        let t = template("body");
        assert!(repo.insert_template(&t, "body", "initial").await.unwrap());
        assert!(!repo.insert_template(&t, "body", "initial").await.unwrap());
        assert_eq!(repo.versions(&t.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_version_after_prune_never_reuses_numbers() {
        let repo = InMemoryTemplateRepository::new();
        let t = template("body");
        repo.insert_template(&t, "body", "initial").await.unwrap();
        for i in 0..4 {
            repo.append_version(&t.id, &format!("v{i}"), None, "").await.unwrap();
        }
        assert_eq!(repo.prune_versions(&t.id, 2).await.unwrap(), 3);

        let next = repo.append_version(&t.id, "after prune", None, "").await.unwrap();
        assert_eq!(next.version, 6);
        let numbers: Vec<i32> = repo.versions(&t.id).await.unwrap().iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn test_append_to_unknown_template_fails() {
        let repo = InMemoryTemplateRepository::new();
        let err = repo.append_version("cv_missing", "x", None, "").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let repo = InMemoryTemplateRepository::new();
        let cv = template("cv body");
        let letter = Template::new(DocumentKind::CoverLetter, "Letter", "letter body", vec![], vec![]);
        repo.insert_template(&cv, "cv body", "").await.unwrap();
        repo.insert_template(&letter, "letter body", "").await.unwrap();

        assert_eq!(repo.list_templates(None).await.unwrap().len(), 2);
        let letters = repo.list_templates(Some(DocumentKind::CoverLetter)).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].id, letter.id);
    }
}
