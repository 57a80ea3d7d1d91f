pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::pipeline::handlers as pipeline;
use crate::recommendation::handlers as recommendation;
use crate::scoring::handlers as scoring;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis + scoring
        .route("/api/v1/postings/analyze", post(analysis::handle_analyze))
        .route("/api/v1/documents/score", post(scoring::handle_score))
        // Template store
        .route(
            "/api/v1/templates",
            get(templates::handle_list).post(templates::handle_create),
        )
        .route("/api/v1/templates/stats", get(templates::handle_stats))
        .route("/api/v1/templates/:id", get(templates::handle_get))
        .route(
            "/api/v1/templates/:id/versions",
            get(templates::handle_versions).post(templates::handle_add_version),
        )
        .route(
            "/api/v1/templates/:id/performance",
            get(templates::handle_performance_history).post(templates::handle_record_performance),
        )
        .route(
            "/api/v1/templates/:id/active",
            patch(templates::handle_set_active),
        )
        // Recommendation + optimization
        .route(
            "/api/v1/recommendations",
            post(recommendation::handle_recommend),
        )
        .route("/api/v1/optimize", post(pipeline::handle_optimize))
        .route(
            "/api/v1/optimize/batch",
            post(pipeline::handle_optimize_batch),
        )
        .route(
            "/api/v1/optimize/jobs/:job_id/cancel",
            post(pipeline::handle_cancel_job),
        )
        .with_state(state)
}
