//! One clustering run over a batch of unprocessed comments.

use inbrain_core::Comment;

use crate::assemble::assemble_clusters;
use crate::client::ClustererClient;
use crate::error::ClustererError;
use crate::types::{ClusterRequest, ClusteringOutcome};

/// Upper bound on comments sent to the model in one run.
pub const MAX_COMMENTS_PER_RUN: usize = 200;

/// Cluster `comments` (oldest first) and return records ready to persist.
///
/// Only the first [`MAX_COMMENTS_PER_RUN`] comments are sent; exactly those
/// are reported in [`ClusteringOutcome::processed_comment_ids`].
///
/// # Errors
///
/// - [`ClustererError::InvalidRequest`] if `request` is out of range.
/// - [`ClustererError::NotEnoughComments`] if fewer than
///   `request.min_cluster_size` comments are available.
/// - [`ClustererError::NoClustersProduced`] if the service yields nothing.
/// - Any client error from [`ClustererClient::propose_clusters`].
pub async fn run_clustering(
    client: &ClustererClient,
    mut comments: Vec<Comment>,
    request: &ClusterRequest,
) -> Result<ClusteringOutcome, ClustererError> {
    request.validate()?;

    comments.truncate(MAX_COMMENTS_PER_RUN);
    let needed = usize::try_from(request.min_cluster_size).unwrap_or(usize::MAX);
    if comments.len() < needed {
        return Err(ClustererError::NotEnoughComments {
            needed,
            found: comments.len(),
        });
    }

    let proposals = client
        .propose_clusters(&comments, request.num_clusters)
        .await?;
    let proposed = proposals.len();
    let clusters = assemble_clusters(proposals, &comments);

    if clusters.is_empty() {
        tracing::warn!(
            comments = comments.len(),
            "clustering service returned no clusters"
        );
        return Err(ClustererError::NoClustersProduced);
    }

    tracing::info!(
        comments = comments.len(),
        proposed,
        clusters = clusters.len(),
        model = client.model(),
        "clustering run complete"
    );

    Ok(ClusteringOutcome {
        clusters,
        processed_comment_ids: comments.iter().map(|c| c.id).collect(),
    })
}
