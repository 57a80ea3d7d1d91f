//! Axum route handlers for template recommendation.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::{extract, JobRequirements};
use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::posting::RawPosting;
use crate::recommendation::engine::{recommend_from_store, Recommendation};
use crate::recommendation::strategy::{select_strategy, OptimizationStrategy};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub posting: Option<RawPosting>,
    #[serde(default)]
    pub requirements: Option<JobRequirements>,
    pub kind: DocumentKind,
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub role_category: String,
    pub recommendation: Recommendation,
    pub strategy: OptimizationStrategy,
}

/// POST /api/v1/recommendations
///
/// Read-only: ranks the stored templates and reports the strategy an
/// optimization run would start with. Nothing is generated or persisted.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let requirements = match (request.requirements, request.posting) {
        (Some(requirements), _) => requirements.normalized(&state.engine.vocabulary),
        (None, Some(posting)) => extract(&posting, &state.engine.vocabulary),
        (None, None) => {
            return Err(AppError::Validation(
                "either posting or requirements must be provided".to_string(),
            ))
        }
    };
    let role_category = requirements.role_category.clone();

    let recommendation = recommend_from_store(
        &state.store,
        &requirements,
        request.kind,
        &role_category,
        &state.engine.recommendation,
    )
    .await?;
    let strategy = select_strategy(
        recommendation.confidence,
        recommendation.template.is_some(),
        request.force_regenerate,
        &state.engine.strategy,
    );

    Ok(Json(RecommendResponse {
        role_category,
        recommendation,
        strategy,
    }))
}
