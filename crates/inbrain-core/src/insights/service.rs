//! Repository-backed entry points used by the server and CLI.

use thiserror::Error;
use uuid::Uuid;

use super::filter::{get_consolidated_clusters, ClusterFilter, ConsolidatedClusters};
use super::repository::{InsightsRepository, ResetOutcome};
use super::summary::{summarize_insights, InsightsSummary};

#[derive(Debug, Error)]
pub enum InsightsError<E: std::error::Error + 'static> {
    #[error("repository error: {0}")]
    Repository(#[source] E),

    /// The reset committed but a follow-up read still sees generated state.
    #[error(
        "reset incomplete: {active_clusters} active clusters and {processed_comments} processed comments remain"
    )]
    ResetIncomplete {
        active_clusters: usize,
        processed_comments: i64,
    },
}

/// Read the user's active clusters and imports and build the filtered,
/// consolidated view.
///
/// Facets are computed over the full active set, so the filter is applied in
/// memory rather than pushed down to the store.
///
/// # Errors
///
/// Returns [`InsightsError::Repository`] if either read fails.
pub async fn load_consolidated_clusters<R: InsightsRepository>(
    repo: &R,
    user_id: Uuid,
    filter: &ClusterFilter,
) -> Result<ConsolidatedClusters, InsightsError<R::Error>> {
    let clusters = repo
        .list_active_clusters(user_id)
        .await
        .map_err(InsightsError::Repository)?;
    let imports = repo
        .list_imports(user_id)
        .await
        .map_err(InsightsError::Repository)?;

    let raw_count = clusters.len();
    let view = get_consolidated_clusters(clusters, filter, &imports);
    tracing::debug!(
        user_id = %user_id,
        raw_clusters = raw_count,
        consolidated = view.total_clusters,
        platform = ?filter.platform,
        import_id = ?filter.import_id,
        "built consolidated cluster view"
    );
    Ok(view)
}

/// # Errors
///
/// Returns [`InsightsError::Repository`] if a read fails.
pub async fn load_insights_summary<R: InsightsRepository>(
    repo: &R,
    user_id: Uuid,
) -> Result<InsightsSummary, InsightsError<R::Error>> {
    let clusters = repo
        .list_active_clusters(user_id)
        .await
        .map_err(InsightsError::Repository)?;
    let stats = repo
        .comment_stats(user_id)
        .await
        .map_err(InsightsError::Repository)?;
    Ok(summarize_insights(clusters, &stats))
}

/// Discard a user's generated clusters and make every comment eligible for
/// reclustering, then confirm the reset is visible.
///
/// # Errors
///
/// Returns [`InsightsError::Repository`] if the reset or the follow-up reads
/// fail, and [`InsightsError::ResetIncomplete`] if active clusters or
/// processed comments are still visible afterwards.
pub async fn reset_insights<R: InsightsRepository>(
    repo: &R,
    user_id: Uuid,
) -> Result<ResetOutcome, InsightsError<R::Error>> {
    let outcome = repo
        .reset_insights(user_id)
        .await
        .map_err(InsightsError::Repository)?;

    let active_clusters = repo
        .list_active_clusters(user_id)
        .await
        .map_err(InsightsError::Repository)?
        .len();
    let stats = repo
        .comment_stats(user_id)
        .await
        .map_err(InsightsError::Repository)?;
    let processed_comments = stats.processed();

    if active_clusters > 0 || processed_comments > 0 {
        tracing::error!(
            user_id = %user_id,
            active_clusters,
            processed_comments,
            "insights reset left generated state behind"
        );
        return Err(InsightsError::ResetIncomplete {
            active_clusters,
            processed_comments,
        });
    }

    tracing::info!(
        user_id = %user_id,
        clusters_deactivated = outcome.clusters_deactivated,
        comments_reset = outcome.comments_reset,
        "insights reset"
    );
    Ok(outcome)
}
