use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use inbrain_core::{ClusterFilter, Comment, ConsolidatedClusters};
use inbrain_db::PgInsightsRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, map_insights_error, ApiError, ApiResponse, AppState};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct ClustersQuery {
    pub platform: Option<String>,
    pub import_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ClusterComments {
    pub items: Vec<Comment>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

pub(super) async fn list_clusters(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ClustersQuery>,
) -> Result<Json<ApiResponse<ConsolidatedClusters>>, ApiError> {
    let filter = ClusterFilter::from_query(query.platform.as_deref(), query.import_id.as_deref())
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let repo = PgInsightsRepository::new(state.pool.clone());
    let view = inbrain_core::load_consolidated_clusters(&repo, user_id, &filter)
        .await
        .map_err(|e| map_insights_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(view, req_id.0)))
}

pub(super) async fn list_cluster_comments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((user_id, cluster_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ClusterComments>>, ApiError> {
    let (page, per_page) = normalize_page(query.page, query.per_page);

    inbrain_db::get_cluster(&state.pool, user_id, cluster_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = inbrain_db::list_cluster_comments(
        &state.pool,
        user_id,
        cluster_id,
        per_page,
        (page - 1).saturating_mul(per_page),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = inbrain_db::count_cluster_comments(&state.pool, user_id, cluster_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = ClusterComments {
        items: rows.into_iter().map(Comment::from).collect(),
        page,
        per_page,
        total,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// 1-based page and a bounded page size.
pub(super) fn normalize_page(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    (
        page.unwrap_or(1).max(1),
        per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
    )
}
