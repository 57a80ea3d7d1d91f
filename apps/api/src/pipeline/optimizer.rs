//! Optimizer — one job through the whole pipeline.
//!
//! Algorithm:
//! 1. Extract + classify the posting
//! 2. Recommend a template of the requested kind and select a strategy
//! 3. Generate from the template (or the caller's base document), validate, score
//! 4. `significant_customization` scoring below the pass threshold is redone
//!    once as `full_regeneration`; the fallback result is kept
//! 5. Persist: a new version + performance record on the template used, or a
//!    new template when the text was not derived from one
//! 6. Optionally render and hand the artifact to delivery
//!
//! Each job carries its own `CancellationToken`, checked between steps and
//! raced against generation. Cancelling one job never touches another.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::extractor::{extract, JobRequirements};
use crate::config::EngineConfig;
use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::posting::RawPosting;
use crate::models::template::PerformanceScores;
use crate::pipeline::collaborators::{
    validate_candidate, ContentGenerator, Destination, DocumentDelivery, DocumentRenderer, GenerationError,
    GenerationRequest,
};
use crate::recommendation::engine::{recommend_from_store, Recommendation};
use crate::recommendation::strategy::{select_strategy, should_fallback, OptimizationStrategy};
use crate::scoring::compatibility::{
    CompatibilityScore, DocumentScorer, CONTENT_STRUCTURE, FORMAT, KEYWORD_MATCH,
};
use crate::templates::store::{NewTemplate, TemplateStore};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Caller-chosen identity; a UUID is assigned when absent.
    #[serde(default)]
    pub job_id: Option<String>,
    pub posting: RawPosting,
    pub kind: DocumentKind,
    /// Used when no template applies, and for full regeneration.
    #[serde(default)]
    pub base_document: Option<String>,
    #[serde(default)]
    pub force_regenerate: bool,
    #[serde(default)]
    pub destination: Option<Destination>,
}

impl OptimizeRequest {
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeOutcome {
    pub job_id: String,
    pub requirements: JobRequirements,
    pub strategy: OptimizationStrategy,
    pub initial_strategy: OptimizationStrategy,
    pub fell_back: bool,
    pub confidence: f64,
    pub template_id: String,
    pub template_version: Option<i32>,
    pub document: String,
    pub score: CompatibilityScore,
    pub delivered: Option<bool>,
}

// ────────────────────────────────────────────────────────────────────────────
// Optimizer
// ────────────────────────────────────────────────────────────────────────────

pub struct Optimizer {
    engine: Arc<EngineConfig>,
    store: Arc<TemplateStore>,
    scorer: Arc<dyn DocumentScorer>,
    generator: Arc<dyn ContentGenerator>,
    renderer: Arc<dyn DocumentRenderer>,
    delivery: Arc<dyn DocumentDelivery>,
    cancellation_tokens: Mutex<HashMap<String, CancellationToken>>,
}

fn cancelled(job_id: &str) -> AppError {
    AppError::Cancelled(format!("job {job_id} was cancelled"))
}

impl Optimizer {
    pub fn new(
        engine: Arc<EngineConfig>,
        store: Arc<TemplateStore>,
        scorer: Arc<dyn DocumentScorer>,
        generator: Arc<dyn ContentGenerator>,
        renderer: Arc<dyn DocumentRenderer>,
        delivery: Arc<dyn DocumentDelivery>,
    ) -> Self {
        Self {
            engine,
            store,
            scorer,
            generator,
            renderer,
            delivery,
            cancellation_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Cancels a running job. Returns `false` when no such job is in flight.
    pub async fn cancel_job(&self, job_id: &str) -> bool {
        let token = {
            let map = self.cancellation_tokens.lock().await;
            map.get(job_id).cloned()
        };
        match token {
            Some(token) => {
                token.cancel();
                info!(job_id, "Optimization job cancelled");
                true
            }
            None => false,
        }
    }

    /// Runs one job, registering `cancel` under its id while it is in flight.
    /// An id that is already in flight is rejected.
    pub async fn optimize(
        &self,
        request: OptimizeRequest,
        cancel: CancellationToken,
    ) -> Result<OptimizeOutcome, AppError> {
        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        {
            let mut map = self.cancellation_tokens.lock().await;
            if map.contains_key(&job_id) {
                return Err(AppError::Validation(format!("job {job_id} is already running")));
            }
            map.insert(job_id.clone(), cancel.clone());
        }

        let result = self.run_pipeline(&job_id, request, &cancel).await;

        {
            let mut map = self.cancellation_tokens.lock().await;
            map.remove(&job_id);
        }

        match &result {
            Ok(outcome) => info!(
                job_id = %job_id,
                strategy = %outcome.strategy,
                overall = outcome.score.overall,
                passed = outcome.score.passed,
                "Optimization finished"
            ),
            Err(e) => warn!(job_id = %job_id, "Optimization failed: {e}"),
        }
        result
    }

    async fn run_pipeline(
        &self,
        job_id: &str,
        request: OptimizeRequest,
        cancel: &CancellationToken,
    ) -> Result<OptimizeOutcome, AppError> {
        let engine = &self.engine;
        let kind = request.kind;

        let requirements = extract(&request.posting, &engine.vocabulary);
        let role = requirements.role_category.clone();

        if cancel.is_cancelled() {
            return Err(cancelled(job_id));
        }
        let recommendation =
            recommend_from_store(&self.store, &requirements, kind, &role, &engine.recommendation).await?;
        let initial_strategy = select_strategy(
            recommendation.confidence,
            recommendation.template.is_some(),
            request.force_regenerate,
            &engine.strategy,
        );
        info!(
            job_id,
            role = %role,
            confidence = recommendation.confidence,
            strategy = %initial_strategy,
            "Strategy selected"
        );

        let template_content = match &recommendation.template {
            Some(t) => Some(self.store.get_latest(&t.id).await?.latest.content),
            None => None,
        };

        let company = request.posting.company_name().to_string();
        let mut strategy = initial_strategy;
        let (mut document, mut score) = self
            .attempt(
                job_id,
                GenerationRequest {
                    kind,
                    strategy,
                    requirements: requirements.clone(),
                    company: company.clone(),
                    source: source_for(strategy, template_content.as_deref(), request.base_document.as_deref()),
                },
                cancel,
            )
            .await?;

        let mut fell_back = false;
        if should_fallback(strategy, score.overall, &engine.strategy) {
            info!(
                job_id,
                overall = score.overall,
                "Significant customization below pass threshold, retrying once as full regeneration"
            );
            strategy = OptimizationStrategy::FullRegeneration;
            let (retry_document, retry_score) = self
                .attempt(
                    job_id,
                    GenerationRequest {
                        kind,
                        strategy,
                        requirements: requirements.clone(),
                        company: company.clone(),
                        source: source_for(strategy, template_content.as_deref(), request.base_document.as_deref()),
                    },
                    cancel,
                )
                .await?;
            document = retry_document;
            score = retry_score;
            fell_back = true;
        }

        if cancel.is_cancelled() {
            return Err(cancelled(job_id));
        }
        let (template_id, template_version) = self
            .persist(&recommendation, strategy, &requirements, &company, kind, &document, &score)
            .await?;

        let delivered = match &request.destination {
            Some(destination) => Some(self.deliver(&document, kind, destination).await?),
            None => None,
        };

        Ok(OptimizeOutcome {
            job_id: job_id.to_string(),
            requirements,
            strategy,
            initial_strategy,
            fell_back,
            confidence: recommendation.confidence,
            template_id,
            template_version,
            document,
            score,
            delivered,
        })
    }

    /// Generate (with the retry policy, raced against cancellation), validate, score.
    async fn attempt(
        &self,
        job_id: &str,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<(String, CompatibilityScore), AppError> {
        let generated = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(job_id)),
            result = self.engine.retry.run(|| self.generator.generate(&request)) => result?,
        };
        validate_candidate(&generated, request.kind, &self.engine.scoring.length)?;
        let score = self.scorer.score(&generated, &request.requirements, request.kind);
        Ok((generated, score))
    }

    /// Text derived from the recommended template becomes its next version;
    /// anything else becomes a new template. Either way a performance record
    /// is appended.
    #[allow(clippy::too_many_arguments)]
    async fn persist(
        &self,
        recommendation: &Recommendation,
        strategy: OptimizationStrategy,
        requirements: &JobRequirements,
        company: &str,
        kind: DocumentKind,
        document: &str,
        score: &CompatibilityScore,
    ) -> Result<(String, Option<i32>), AppError> {
        let notes = format!("{strategy} for {} at {company}", requirements.title);

        let (template_id, version) = match (&recommendation.template, strategy.uses_template()) {
            (Some(template), true) => {
                let version = self
                    .store
                    .add_version(&template.id, document, Some(score.overall), &notes)
                    .await?;
                (template.id.clone(), Some(version.version))
            }
            _ => {
                let mut keywords: Vec<String> = requirements
                    .technical_skills
                    .iter()
                    .map(|(_, s)| s.to_string())
                    .collect();
                keywords.extend(requirements.methodologies.iter().cloned());
                let id = self
                    .store
                    .create(NewTemplate {
                        kind,
                        name: format!("{} ({company})", requirements.title),
                        content: document.to_string(),
                        keywords,
                        role_categories: vec![requirements.role_category.clone()],
                    })
                    .await?;
                (id, None)
            }
        };

        self.store
            .record_performance(
                &template_id,
                &requirements.title,
                company,
                PerformanceScores {
                    overall: score.overall,
                    keyword: score.sub_score(KEYWORD_MATCH),
                    format: score.sub_score(FORMAT),
                    structure: score.sub_score(CONTENT_STRUCTURE),
                },
                score.passed,
            )
            .await?;

        Ok((template_id, version))
    }

    async fn deliver(&self, document: &str, kind: DocumentKind, destination: &Destination) -> Result<bool, AppError> {
        let artifact = self.renderer.render(document, kind).await?;
        if !artifact.valid {
            return Err(AppError::Rendering(format!("renderer produced an invalid {kind} artifact")));
        }
        if !self.delivery.deliver(&artifact, destination).await? {
            return Err(AppError::Delivery(format!(
                "delivery to {} was refused",
                destination.recipient
            )));
        }
        Ok(true)
    }
}

/// Template-based strategies start from the template; regeneration prefers the
/// caller's base document and falls back to the template.
fn source_for(
    strategy: OptimizationStrategy,
    template_content: Option<&str>,
    base_document: Option<&str>,
) -> Option<String> {
    let source = if strategy.uses_template() {
        template_content.or(base_document)
    } else {
        base_document.or(template_content)
    };
    source.map(str::to_string)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
