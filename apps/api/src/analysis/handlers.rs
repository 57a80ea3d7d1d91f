//! Axum route handlers for posting analysis.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::analysis::classifier::{role_scores, RoleScore};
use crate::analysis::extractor::{extract, JobRequirements};
use crate::errors::AppError;
use crate::models::posting::RawPosting;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub requirements: JobRequirements,
    pub role_scores: Vec<RoleScore>,
}

/// POST /api/v1/postings/analyze
///
/// Extracts the requirement profile and per-role classifier scores.
/// Empty postings are not an error: they yield an empty, default-role profile.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(posting): Json<RawPosting>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let vocabulary = &state.engine.vocabulary;
    let requirements = extract(&posting, vocabulary);
    let role_scores = role_scores(&posting.title, &posting.description, vocabulary);

    tracing::debug!(
        role = %requirements.role_category,
        skills = requirements.technical_skills.len(),
        "Posting analyzed"
    );

    Ok(Json(AnalyzeResponse {
        requirements,
        role_scores,
    }))
}
