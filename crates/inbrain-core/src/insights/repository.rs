use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{Cluster, CommentStats, Import};

/// Rows touched by a reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub clusters_deactivated: u64,
    pub comments_reset: u64,
}

/// Storage capabilities the insights service needs.
///
/// Implementations must return active clusters in a stable order (as stored)
/// so that consolidation is repeatable across reads.
pub trait InsightsRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All active clusters owned by `user_id`, in stored order.
    fn list_active_clusters(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Cluster>, Self::Error>> + Send;

    fn comment_stats(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<CommentStats, Self::Error>> + Send;

    /// The user's imports, newest first.
    fn list_imports(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Import>, Self::Error>> + Send;

    /// Deactivate every cluster of `user_id` and unlink/unprocess every one of
    /// their comments. Both writes commit together or not at all.
    fn reset_insights(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<ResetOutcome, Self::Error>> + Send;
}
