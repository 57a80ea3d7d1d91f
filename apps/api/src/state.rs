use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, EngineConfig};
use crate::pipeline::collaborators::{ContentGenerator, DocumentDelivery, DocumentRenderer};
use crate::pipeline::optimizer::Optimizer;
use crate::scoring::compatibility::{AtsScorer, DocumentScorer};
use crate::templates::cache::TemplateCache;
use crate::templates::repository::TemplateRepository;
use crate::templates::store::TemplateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Vocabulary, weights and thresholds shared by every component.
    pub engine: Arc<EngineConfig>,
    pub store: Arc<TemplateStore>,
    /// Pluggable document scorer. Default: AtsScorer.
    pub scorer: Arc<dyn DocumentScorer>,
    pub optimizer: Arc<Optimizer>,
}

/// Backends and collaborators chosen at startup.
pub struct Components {
    pub repository: Arc<dyn TemplateRepository>,
    pub cache: Arc<dyn TemplateCache>,
    pub generator: Arc<dyn ContentGenerator>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub delivery: Arc<dyn DocumentDelivery>,
}

impl AppState {
    pub fn new(config: Config, components: Components) -> Result<Self> {
        let engine = Arc::new(config.engine_config()?);
        let store = Arc::new(TemplateStore::new(
            components.repository,
            components.cache,
            config.version_retention,
        ));
        let scorer: Arc<dyn DocumentScorer> = Arc::new(AtsScorer::new(engine.clone()));
        let optimizer = Arc::new(Optimizer::new(
            engine.clone(),
            store.clone(),
            scorer.clone(),
            components.generator,
            components.renderer,
            components.delivery,
        ));

        Ok(Self {
            config,
            engine,
            store,
            scorer,
            optimizer,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pipeline::collaborators::{LogDelivery, PlainTextRenderer, TemplateFillGenerator};
    use crate::templates::cache::MemoryTemplateCache;
    use crate::templates::repository::InMemoryTemplateRepository;

    pub(crate) fn test_config() -> Config {
        Config {
            database_url: None,
            redis_url: None,
            port: 0,
            rust_log: "debug".to_string(),
            template_cache_ttl: Duration::from_secs(60),
            batch_concurrency: 2,
            version_retention: 10,
            pass_threshold: 75.0,
            generation_max_attempts: 3,
        }
    }

    /// Fully in-process state: memory repository and cache, template-fill generation.
    pub(crate) fn in_memory_state() -> AppState {
        AppState::new(
            test_config(),
            Components {
                repository: Arc::new(InMemoryTemplateRepository::new()),
                cache: Arc::new(MemoryTemplateCache::new(Duration::from_secs(60))),
                generator: Arc::new(TemplateFillGenerator::default()),
                renderer: Arc::new(PlainTextRenderer),
                delivery: Arc::new(LogDelivery),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_engine_picks_up_config_overrides() {
        let mut config = test_config();
        config.pass_threshold = 60.0;
        config.generation_max_attempts = 5;
        let state = AppState::new(
            config,
            Components {
                repository: Arc::new(InMemoryTemplateRepository::new()),
                cache: Arc::new(MemoryTemplateCache::new(Duration::from_secs(60))),
                generator: Arc::new(TemplateFillGenerator::default()),
                renderer: Arc::new(PlainTextRenderer),
                delivery: Arc::new(LogDelivery),
            },
        )
        .unwrap();
        assert_eq!(state.engine.scoring.pass_threshold, 60.0);
        assert_eq!(state.engine.strategy.pass_threshold, 60.0);
        assert_eq!(state.engine.retry.max_attempts, 5);
    }
}
