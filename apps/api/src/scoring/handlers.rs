//! Axum route handlers for document scoring.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::analysis::extractor::{extract, JobRequirements};
use crate::errors::AppError;
use crate::models::document::CandidateDocument;
use crate::models::posting::RawPosting;
use crate::scoring::compatibility::CompatibilityScore;
use crate::state::AppState;

/// Either a raw posting to extract from, or an already extracted profile.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub posting: Option<RawPosting>,
    #[serde(default)]
    pub requirements: Option<JobRequirements>,
    pub document: CandidateDocument,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub requirements: JobRequirements,
    pub score: CompatibilityScore,
}

/// POST /api/v1/documents/score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let requirements = match (request.requirements, request.posting) {
        (Some(requirements), _) => requirements.normalized(&state.engine.vocabulary),
        (None, Some(posting)) => extract(&posting, &state.engine.vocabulary),
        (None, None) => {
            return Err(AppError::Validation(
                "either posting or requirements must be provided".to_string(),
            ))
        }
    };

    let score = state
        .scorer
        .score(&request.document.text, &requirements, request.document.kind);

    tracing::info!(
        kind = %request.document.kind,
        overall = score.overall,
        passed = score.passed,
        "Document scored"
    );

    Ok(Json(ScoreResponse {
        requirements,
        score,
    }))
}
