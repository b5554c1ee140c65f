mod clusters;
mod comments;
mod insights;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use inbrain_clusterer::{ClustererClient, ClustererError};
use inbrain_core::InsightsError;
use inbrain_db::DbError;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::generation::GenerationError;
use crate::in_flight::InFlight;
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no clustering key is configured.
    pub clusterer: Option<Arc<ClustererClient>>,
    pub in_flight: InFlight,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "not_enough_comments" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "no_clusters_produced" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "clusterer_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_insights_error(request_id: String, error: &InsightsError<DbError>) -> ApiError {
    match error {
        InsightsError::Repository(e) => map_db_error(request_id, e),
        InsightsError::ResetIncomplete { .. } => {
            ApiError::new(request_id, "reset_incomplete", error.to_string())
        }
    }
}

pub(super) fn map_generation_error(request_id: String, error: &GenerationError) -> ApiError {
    match error {
        GenerationError::Db(e) => map_db_error(request_id, e),
        GenerationError::Clusterer(e) => match e {
            ClustererError::InvalidRequest(msg) => {
                ApiError::new(request_id, "validation_error", msg.clone())
            }
            ClustererError::NotEnoughComments { .. } => {
                ApiError::new(request_id, "not_enough_comments", e.to_string())
            }
            ClustererError::NoClustersProduced => {
                ApiError::new(request_id, "no_clusters_produced", e.to_string())
            }
            ClustererError::Http(_)
            | ClustererError::Api { .. }
            | ClustererError::Deserialize { .. } => {
                tracing::error!(error = %e, "clustering service call failed");
                ApiError::new(
                    request_id,
                    "clusterer_unavailable",
                    "clustering service unavailable",
                )
            }
        },
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/users/{user_id}/clusters",
            get(clusters::list_clusters),
        )
        .route(
            "/api/v1/users/{user_id}/clusters/{cluster_id}/comments",
            get(clusters::list_cluster_comments),
        )
        .route(
            "/api/v1/users/{user_id}/comments/stats",
            get(comments::comment_stats),
        )
        .route(
            "/api/v1/users/{user_id}/insights/summary",
            get(insights::summary),
        )
        .route(
            "/api/v1/users/{user_id}/insights/generate",
            post(insights::generate),
        )
        .route(
            "/api/v1/users/{user_id}/insights/reset",
            post(insights::reset),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match inbrain_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    database: "ok",
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    req_id.0,
                )),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
