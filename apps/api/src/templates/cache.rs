//! Read cache in front of `get_latest`.
//!
//! Entries expire after a fixed TTL; `TemplateStore` also invalidates an id
//! on every write to it, so TTL only bounds staleness for other processes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::AppError;
use crate::models::template::TemplateWithContent;

#[async_trait]
pub trait TemplateCache: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<TemplateWithContent>, AppError>;
    async fn set(&self, id: &str, value: &TemplateWithContent) -> Result<(), AppError>;
    async fn invalidate(&self, id: &str) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process TTL map
// ────────────────────────────────────────────────────────────────────────────

pub struct MemoryTemplateCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, TemplateWithContent)>>,
}

impl MemoryTemplateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (Instant, TemplateWithContent)>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Cache("template cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl TemplateCache for MemoryTemplateCache {
    async fn get(&self, id: &str) -> Result<Option<TemplateWithContent>, AppError> {
        let mut entries = self.lock()?;
        match entries.get(id) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, id: &str, value: &TemplateWithContent) -> Result<(), AppError> {
        self.lock()?
            .insert(id.to_string(), (Instant::now(), value.clone()));
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> Result<(), AppError> {
        self.lock()?.remove(id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

/// JSON values under `template:<id>` with `SET .. EX <ttl>`.
pub struct RedisTemplateCache {
    client: redis::Client,
    ttl: Duration,
}

impl RedisTemplateCache {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(id: &str) -> String {
        format!("template:{id}")
    }
}

#[async_trait]
impl TemplateCache for RedisTemplateCache {
    async fn get(&self, id: &str) -> Result<Option<TemplateWithContent>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;
        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| AppError::Cache(format!("corrupt cache entry for {id}: {e}")))
        })
        .transpose()
    }

    async fn set(&self, id: &str, value: &TemplateWithContent) -> Result<(), AppError> {
        let json = serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(id))
            .arg(json)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentKind;
    use crate::models::template::{Template, TemplateVersion};
    use chrono::Utc;

    fn entry(content: &str) -> TemplateWithContent {
        let template = Template::new(DocumentKind::Cv, "Backend", content, vec![], vec![]);
        TemplateWithContent {
            latest: TemplateVersion {
                template_id: template.id.clone(),
                version: 1,
                content: content.to_string(),
                performance_score: None,
                notes: String::new(),
                created_at: Utc::now(),
            },
            template,
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryTemplateCache::new(Duration::from_secs(60));
        let value = entry("body");
        cache.set("a", &value).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(value));
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = MemoryTemplateCache::new(Duration::from_secs(60));
        cache.set("a", &entry("body")).await.unwrap();
        cache.invalidate("a").await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryTemplateCache::new(Duration::from_secs(7200));
        cache.set("a", &entry("body")).await.unwrap();

        tokio::time::advance(Duration::from_secs(7199)).await;
        assert!(cache.get("a").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("a").await.unwrap().is_none());
    }
}
