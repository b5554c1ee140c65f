//! Postgres-backed [`InsightsRepository`].

use std::collections::HashMap;

use inbrain_core::{Cluster, CommentStats, Import, InsightsRepository, LinkCount, ResetOutcome};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgInsightsRepository {
    pool: PgPool,
}

impl PgInsightsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl InsightsRepository for PgInsightsRepository {
    type Error = DbError;

    async fn list_active_clusters(&self, user_id: Uuid) -> Result<Vec<Cluster>, DbError> {
        let rows = crate::clusters::list_active_clusters(&self.pool, user_id).await?;
        let mut links: HashMap<Uuid, Vec<LinkCount>> = HashMap::new();
        for row in crate::clusters::list_cluster_link_counts(&self.pool, user_id).await? {
            links.entry(row.cluster_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut cluster = Cluster::from(row);
                cluster.link_counts = links.remove(&cluster.id).unwrap_or_default();
                cluster
            })
            .collect())
    }

    async fn comment_stats(&self, user_id: Uuid) -> Result<CommentStats, DbError> {
        crate::comments::comment_stats(&self.pool, user_id).await
    }

    async fn list_imports(&self, user_id: Uuid) -> Result<Vec<Import>, DbError> {
        let rows = crate::imports::list_imports(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(Import::from).collect())
    }

    async fn reset_insights(&self, user_id: Uuid) -> Result<ResetOutcome, DbError> {
        crate::clusters::reset_insights(&self.pool, user_id).await
    }
}
