//! Batch optimization: many jobs, bounded concurrency, results by job id.
//!
//! Jobs run through `buffer_unordered(concurrency)` and complete in any order;
//! each result is tagged with its job id and the list is returned in
//! submission order. One job failing or being cancelled leaves the others alone.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::optimizer::{OptimizeOutcome, OptimizeRequest, Optimizer};

pub struct BatchJob {
    pub request: OptimizeRequest,
    pub cancel: CancellationToken,
}

impl BatchJob {
    /// Assigns a UUID job id when the request has none.
    pub fn new(mut request: OptimizeRequest) -> Self {
        if request.job_id.is_none() {
            request.job_id = Some(Uuid::new_v4().to_string());
        }
        Self {
            request,
            cancel: CancellationToken::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        self.request.job_id().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct BatchResult {
    pub job_id: String,
    pub result: Result<OptimizeOutcome, AppError>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub passed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.result.is_ok()).count();
        let passed = results
            .iter()
            .filter(|r| matches!(&r.result, Ok(o) if o.score.passed))
            .count();
        Self {
            total: results.len(),
            succeeded,
            passed,
            failed: results.len() - succeeded,
        }
    }
}

impl Optimizer {
    pub async fn optimize_batch(&self, jobs: Vec<BatchJob>, concurrency: usize) -> Vec<BatchResult> {
        let total = jobs.len();
        let concurrency = concurrency.max(1);
        info!(total, concurrency, "Starting batch optimization");

        let mut results: Vec<(usize, BatchResult)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let job_id = job.job_id().to_string();
                let result = self.optimize(job.request, job.cancel).await;
                (index, BatchResult { job_id, result })
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<BatchResult> = results.into_iter().map(|(_, r)| r).collect();

        let summary = BatchSummary::from_results(&results);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            passed = summary.passed,
            failed = summary.failed,
            "Batch optimization finished"
        );
        results
    }
}
