use axum::{
    extract::{Path, State},
    Extension, Json,
};
use inbrain_clusterer::ClusterRequest;
use inbrain_core::{InsightsSummary, ResetOutcome};
use inbrain_db::PgInsightsRepository;
use uuid::Uuid;

use crate::generation::{generate_for_user, GenerationReport};
use crate::middleware::RequestId;

use super::{map_generation_error, map_insights_error, ApiError, ApiResponse, AppState};

pub(super) async fn summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InsightsSummary>>, ApiError> {
    let repo = PgInsightsRepository::new(state.pool.clone());
    let summary = inbrain_core::load_insights_summary(&repo, user_id)
        .await
        .map_err(|e| map_insights_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(summary, req_id.0)))
}

pub(super) async fn generate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    body: Option<Json<ClusterRequest>>,
) -> Result<Json<ApiResponse<GenerationReport>>, ApiError> {
    let Some(client) = state.clusterer.as_deref() else {
        return Err(ApiError::new(
            req_id.0,
            "clusterer_unavailable",
            "cluster generation is not configured",
        ));
    };
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let Some(_guard) = state.in_flight.try_acquire(user_id) else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "cluster generation already running for this user",
        ));
    };

    let report = generate_for_user(&state.pool, client, user_id, &request)
        .await
        .map_err(|e| map_generation_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(report, req_id.0)))
}

pub(super) async fn reset(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResetOutcome>>, ApiError> {
    // A run committing after the reset would bring generated state back.
    let Some(_guard) = state.in_flight.try_acquire(user_id) else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "cluster generation is running for this user",
        ));
    };

    let repo = PgInsightsRepository::new(state.pool.clone());
    let outcome = inbrain_core::reset_insights(&repo, user_id)
        .await
        .map_err(|e| map_insights_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(outcome, req_id.0)))
}
