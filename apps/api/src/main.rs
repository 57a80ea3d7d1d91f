mod analysis;
mod config;
mod db;
mod errors;
mod models;
mod pipeline;
mod recommendation;
mod routes;
mod scoring;
mod state;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::collaborators::{LogDelivery, PlainTextRenderer, TemplateFillGenerator};
use crate::routes::build_router;
use crate::state::{AppState, Components};
use crate::templates::cache::{MemoryTemplateCache, RedisTemplateCache, TemplateCache};
use crate::templates::postgres::PgTemplateRepository;
use crate::templates::repository::{InMemoryTemplateRepository, TemplateRepository};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Template persistence: PostgreSQL when configured, in-process otherwise
    let repository: Arc<dyn TemplateRepository> = match &config.database_url {
        Some(url) => Arc::new(PgTemplateRepository::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set, templates are kept in memory only");
            Arc::new(InMemoryTemplateRepository::new())
        }
    };

    // Read cache: Redis when configured
    let cache: Arc<dyn TemplateCache> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Redis template cache initialized");
            Arc::new(RedisTemplateCache::new(client, config.template_cache_ttl))
        }
        None => Arc::new(MemoryTemplateCache::new(config.template_cache_ttl)),
    };

    let state = AppState::new(
        config.clone(),
        Components {
            repository,
            cache,
            generator: Arc::new(TemplateFillGenerator::default()),
            renderer: Arc::new(PlainTextRenderer),
            delivery: Arc::new(LogDelivery),
        },
    )?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
