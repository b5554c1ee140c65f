//! Fetch, cluster, and persist one user's unprocessed comments.

use inbrain_clusterer::{run_clustering, ClusterRequest, ClustererClient, ClustererError};
use inbrain_core::{Cluster, Comment};
use inbrain_db::DbError;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Clusterer(#[from] ClustererError),
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub clusters_created: usize,
    pub comments_processed: usize,
    pub clusters: Vec<Cluster>,
}

/// Run one clustering pass for `user_id` and store the result atomically.
///
/// # Errors
///
/// Returns [`GenerationError::Clusterer`] for request, service, or content
/// failures (nothing is written), or [`GenerationError::Db`] if reading or
/// persisting fails.
pub async fn generate_for_user(
    pool: &PgPool,
    client: &ClustererClient,
    user_id: Uuid,
    request: &ClusterRequest,
) -> Result<GenerationReport, GenerationError> {
    request.validate()?;

    let limit = i64::try_from(inbrain_clusterer::MAX_COMMENTS_PER_RUN).unwrap_or(i64::MAX);
    let comments: Vec<Comment> = inbrain_db::list_unprocessed_comments(pool, user_id, limit)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect();

    let outcome = run_clustering(client, comments, request).await?;
    let stored = inbrain_db::insert_generated_clusters(
        pool,
        user_id,
        &outcome.clusters,
        &outcome.processed_comment_ids,
    )
    .await?;

    tracing::info!(
        user_id = %user_id,
        clusters_created = stored.clusters.len(),
        comments_processed = stored.comments_claimed,
        "generated insight clusters"
    );

    Ok(GenerationReport {
        clusters_created: stored.clusters.len(),
        comments_processed: stored.comments_claimed,
        clusters: stored.clusters.into_iter().map(Cluster::from).collect(),
    })
}
