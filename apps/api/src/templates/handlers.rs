use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::template::{
    PerformanceRecord, PerformanceScores, Template, TemplateAggregates, TemplateVersion, TemplateWithContent,
};
use crate::state::AppState;
use crate::templates::store::{NewTemplate, TemplateStats};

#[derive(Deserialize)]
pub struct CreateTemplateRequest {
    pub kind: DocumentKind,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub role_categories: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateTemplateResponse {
    pub template_id: String,
}

#[derive(Deserialize)]
pub struct KindQuery {
    pub kind: Option<DocumentKind>,
}

#[derive(Deserialize)]
pub struct AddVersionRequest {
    pub content: String,
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Deserialize)]
pub struct RecordPerformanceRequest {
    pub job_title: String,
    #[serde(default)]
    pub company: String,
    pub scores: PerformanceScores,
    /// Defaults to `scores.overall >= pass threshold`.
    pub success: Option<bool>,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// POST /api/v1/templates
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<CreateTemplateResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let template_id = state
        .store
        .create(NewTemplate {
            kind: req.kind,
            name: req.name,
            content: req.content,
            keywords: req.keywords,
            role_categories: req.role_categories,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreateTemplateResponse { template_id })))
}

/// GET /api/v1/templates?kind=cv
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<KindQuery>,
) -> Result<Json<Vec<Template>>, AppError> {
    Ok(Json(state.store.list(params.kind).await?))
}

/// GET /api/v1/templates/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<TemplateStats>, AppError> {
    Ok(Json(state.store.stats().await?))
}

/// GET /api/v1/templates/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateWithContent>, AppError> {
    Ok(Json(state.store.get_latest(&id).await?))
}

/// GET /api/v1/templates/:id/versions
pub async fn handle_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TemplateVersion>>, AppError> {
    Ok(Json(state.store.versions(&id).await?))
}

/// POST /api/v1/templates/:id/versions
pub async fn handle_add_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddVersionRequest>,
) -> Result<(StatusCode, Json<TemplateVersion>), AppError> {
    if let Some(score) = req.performance_score {
        if !(0.0..=100.0).contains(&score) {
            return Err(AppError::Validation("performance_score must be within 0–100".to_string()));
        }
    }
    let version = state
        .store
        .add_version(&id, &req.content, req.performance_score, &req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// GET /api/v1/templates/:id/performance
pub async fn handle_performance_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PerformanceRecord>>, AppError> {
    Ok(Json(state.store.performance_history(&id).await?))
}

/// POST /api/v1/templates/:id/performance
pub async fn handle_record_performance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RecordPerformanceRequest>,
) -> Result<Json<TemplateAggregates>, AppError> {
    let s = req.scores;
    if [s.overall, s.keyword, s.format, s.structure]
        .iter()
        .any(|v| !(0.0..=100.0).contains(v))
    {
        return Err(AppError::Validation("scores must be within 0–100".to_string()));
    }
    let success = req
        .success
        .unwrap_or(s.overall >= state.engine.scoring.pass_threshold);
    let aggregates = state
        .store
        .record_performance(&id, &req.job_title, &req.company, s, success)
        .await?;
    Ok(Json(aggregates))
}

/// PATCH /api/v1/templates/:id/active
pub async fn handle_set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Result<StatusCode, AppError> {
    state.store.set_active(&id, req.active).await?;
    Ok(StatusCode::NO_CONTENT)
}
