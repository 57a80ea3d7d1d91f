//! Template Store — versioned templates with performance-driven aggregates.
//!
//! Writes for one template id are serialised through a keyed async mutex and
//! always end by invalidating the cached `get_latest` entry for that id. Cache
//! fills also happen under that lock, so a fill can never race a write and
//! re-insert pre-write content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::template::{
    PerformanceRecord, PerformanceScores, Template, TemplateAggregates, TemplateVersion, TemplateWithContent,
};
use crate::templates::cache::TemplateCache;
use crate::templates::repository::TemplateRepository;

/// Input for `TemplateStore::create`.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub kind: DocumentKind,
    pub name: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub role_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KindStats {
    pub kind: DocumentKind,
    pub templates: usize,
    pub active: usize,
    pub total_usage: i64,
    pub mean_success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateStats {
    pub total_templates: usize,
    pub by_kind: Vec<KindStats>,
    /// Highest success rate among used templates; ties go to the higher average score.
    pub best_template: Option<Template>,
}

pub struct TemplateStore {
    repository: Arc<dyn TemplateRepository>,
    cache: Arc<dyn TemplateCache>,
    version_retention: usize,
    locks: LockRegistry,
}

type LockRegistry = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Holds one id's write lock. On release the registry entry is dropped
/// unless another caller still holds or waits for it.
struct IdGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a LockRegistry,
    id: String,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Ok(mut locks) = self.locks.lock() {
            if locks.get(&self.id).is_some_and(|l| Arc::strong_count(l) == 1) {
                locks.remove(&self.id);
            }
        }
    }
}

impl TemplateStore {
    pub fn new(
        repository: Arc<dyn TemplateRepository>,
        cache: Arc<dyn TemplateCache>,
        version_retention: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            version_retention: version_retention.max(1),
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_id(&self, id: &str) -> Result<IdGuard<'_>, AppError> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("template lock registry poisoned")))?;
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        Ok(IdGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.locks,
            id: id.to_string(),
        })
    }

    #[cfg(test)]
    fn registered_locks(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Creates a template with `content` as version 1. Idempotent: the id is a
    /// digest of kind + content, so re-creating returns the existing id.
    pub async fn create(&self, new: NewTemplate) -> Result<String, AppError> {
        if new.content.trim().is_empty() {
            return Err(AppError::Validation("template content cannot be empty".to_string()));
        }
        let template = Template::new(new.kind, new.name, &new.content, new.keywords, new.role_categories);
        let _guard = self.lock_id(&template.id).await?;

        let created = self
            .repository
            .insert_template(&template, &new.content, "Initial version")
            .await?;
        if created {
            info!(template_id = %template.id, kind = %template.kind, "Template created");
        } else {
            debug!(template_id = %template.id, "Template already exists");
        }
        Ok(template.id)
    }

    /// Template record plus its newest version, served through the cache.
    pub async fn get_latest(&self, id: &str) -> Result<TemplateWithContent, AppError> {
        match self.cache.get(id).await {
            Ok(Some(hit)) => {
                debug!(template_id = %id, "Template cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(template_id = %id, "Template cache read failed: {e}"),
        }

        let _guard = self.lock_id(id).await?;
        let value = self.load(id).await?;
        if let Err(e) = self.cache.set(id, &value).await {
            warn!(template_id = %id, "Template cache fill failed: {e}");
        }
        Ok(value)
    }

    async fn load(&self, id: &str) -> Result<TemplateWithContent, AppError> {
        let template = self
            .repository
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;
        let latest = self
            .repository
            .latest_version(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {id} has no versions")))?;
        Ok(TemplateWithContent { template, latest })
    }

    /// Appends a version numbered `max + 1`, prunes to the retention window,
    /// and invalidates the cached read.
    pub async fn add_version(
        &self,
        id: &str,
        content: &str,
        performance_score: Option<f64>,
        notes: &str,
    ) -> Result<TemplateVersion, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("version content cannot be empty".to_string()));
        }
        let _guard = self.lock_id(id).await?;

        let version = self
            .repository
            .append_version(id, content, performance_score, notes)
            .await?;
        // The append is committed: invalidate before anything else can fail.
        self.cache.invalidate(id).await?;
        let pruned = self.repository.prune_versions(id, self.version_retention).await?;

        info!(
            template_id = %id,
            version = version.version,
            pruned,
            "Template version added"
        );
        Ok(version)
    }

    /// Appends a performance record, then recomputes every aggregate from the
    /// full history. This is the only writer of aggregate fields.
    pub async fn record_performance(
        &self,
        id: &str,
        job_title: &str,
        company: &str,
        scores: PerformanceScores,
        success: bool,
    ) -> Result<TemplateAggregates, AppError> {
        let _guard = self.lock_id(id).await?;

        let record = PerformanceRecord::new(id, job_title, company, scores, success);
        self.repository.append_performance(&record).await?;

        let records = self.repository.performance_records(id).await?;
        let aggregates = TemplateAggregates::from_records(&records);
        self.repository.write_aggregates(id, &aggregates).await?;
        self.cache.invalidate(id).await?;

        info!(
            template_id = %id,
            usage_count = aggregates.usage_count,
            success_rate = aggregates.success_rate,
            average_score = aggregates.average_score,
            "Template performance recorded"
        );
        Ok(aggregates)
    }

    pub async fn list(&self, kind: Option<DocumentKind>) -> Result<Vec<Template>, AppError> {
        self.repository.list_templates(kind).await
    }

    pub async fn versions(&self, id: &str) -> Result<Vec<TemplateVersion>, AppError> {
        self.ensure_exists(id).await?;
        self.repository.versions(id).await
    }

    pub async fn performance_history(&self, id: &str) -> Result<Vec<PerformanceRecord>, AppError> {
        self.ensure_exists(id).await?;
        self.repository.performance_records(id).await
    }

    /// Inactive templates stay readable but are never recommended.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<(), AppError> {
        let _guard = self.lock_id(id).await?;
        if !self.repository.set_active(id, active).await? {
            return Err(AppError::NotFound(format!("Template {id} not found")));
        }
        self.cache.invalidate(id).await?;
        info!(template_id = %id, active, "Template activation changed");
        Ok(())
    }

    pub async fn stats(&self) -> Result<TemplateStats, AppError> {
        let templates = self.repository.list_templates(None).await?;

        let by_kind = [DocumentKind::Cv, DocumentKind::CoverLetter]
            .into_iter()
            .map(|kind| {
                let of_kind: Vec<&Template> = templates.iter().filter(|t| t.kind == kind).collect();
                let mean_success_rate = if of_kind.is_empty() {
                    0.0
                } else {
                    of_kind.iter().map(|t| t.success_rate).sum::<f64>() / of_kind.len() as f64
                };
                KindStats {
                    kind,
                    templates: of_kind.len(),
                    active: of_kind.iter().filter(|t| t.is_active).count(),
                    total_usage: of_kind.iter().map(|t| t.usage_count).sum(),
                    mean_success_rate,
                }
            })
            .collect();

        let best_template = templates
            .iter()
            .filter(|t| t.usage_count > 0)
            .fold(None::<&Template>, |best, t| match best {
                Some(b)
                    if (b.success_rate, b.average_score) >= (t.success_rate, t.average_score) =>
                {
                    Some(b)
                }
                _ => Some(t),
            })
            .cloned();

        Ok(TemplateStats {
            total_templates: templates.len(),
            by_kind,
            best_template,
        })
    }

    async fn ensure_exists(&self, id: &str) -> Result<(), AppError> {
        match self.repository.get_template(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Template {id} not found"))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
