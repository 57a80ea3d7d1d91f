//! Axum route handlers for single and batch optimization jobs.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::errors::AppError;
use crate::pipeline::batch::{BatchJob, BatchSummary};
use crate::pipeline::optimizer::{OptimizeOutcome, OptimizeRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub jobs: Vec<OptimizeRequest>,
    /// Lowers the configured concurrency for this batch; never raises it.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OptimizeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub summary: BatchSummary,
    pub results: Vec<BatchItem>,
}

/// POST /api/v1/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeOutcome>, AppError> {
    let outcome = state
        .optimizer
        .optimize(request, CancellationToken::new())
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/optimize/batch
/// Per-job failures are reported inline; the batch itself only fails on a bad request.
pub async fn handle_optimize_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    if request.jobs.is_empty() {
        return Err(AppError::Validation("jobs must not be empty".to_string()));
    }

    let jobs: Vec<BatchJob> = request.jobs.into_iter().map(BatchJob::new).collect();
    let mut seen = HashSet::new();
    for job in &jobs {
        if !seen.insert(job.job_id().to_string()) {
            return Err(AppError::Validation(format!(
                "duplicate job_id '{}'",
                job.job_id()
            )));
        }
    }

    let concurrency = effective_concurrency(request.concurrency, state.config.batch_concurrency);
    let results = state.optimizer.optimize_batch(jobs, concurrency).await;
    let summary = BatchSummary::from_results(&results);

    let results = results
        .into_iter()
        .map(|r| match r.result {
            Ok(outcome) => BatchItem {
                job_id: r.job_id,
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => BatchItem {
                job_id: r.job_id,
                outcome: None,
                error: Some(JobError {
                    code: e.kind(),
                    message: e.public_parts().1,
                }),
            },
        })
        .collect();

    Ok(Json(BatchResponse { summary, results }))
}

/// A requested concurrency is clamped to `1..=limit`.
fn effective_concurrency(requested: Option<usize>, limit: usize) -> usize {
    requested.unwrap_or(limit).clamp(1, limit.max(1))
}

/// POST /api/v1/optimize/jobs/:job_id/cancel
pub async fn handle_cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.optimizer.cancel_job(&job_id).await {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(AppError::NotFound(format!("no running job '{job_id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_never_exceeds_configured_limit() {
        assert_eq!(effective_concurrency(Some(1000), 3), 3);
        assert_eq!(effective_concurrency(Some(2), 3), 2);
        assert_eq!(effective_concurrency(Some(0), 3), 1);
        assert_eq!(effective_concurrency(None, 3), 3);
    }
}
