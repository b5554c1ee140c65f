//! Database operations for `clusters` and `cluster_comments`.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use inbrain_core::{Cluster, ContentIdea, LinkCount, NewCluster, Platform, ResetOutcome};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

const CLUSTER_COLUMNS: &str = "id, user_id, theme, summary, comment_count, sample_comments, \
     content_ideas, primary_platform, platforms, import_ids, is_active, created_at, updated_at";

/// A row from the `clusters` table.
///
/// `theme` and `comment_count` are nullable in the schema; the JSONB columns
/// are decoded loosely so that a malformed element never fails the read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClusterRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub theme: Option<String>,
    pub summary: Option<String>,
    pub comment_count: Option<i32>,
    pub sample_comments: serde_json::Value,
    pub content_ideas: serde_json::Value,
    pub primary_platform: Option<String>,
    pub platforms: Vec<String>,
    pub import_ids: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClusterRow> for Cluster {
    fn from(row: ClusterRow) -> Self {
        let sample_comments = match row.sample_comments {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let content_ideas = match row.content_ideas {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<ContentIdea>(v).ok())
                .collect(),
            _ => Vec::new(),
        };

        Cluster {
            id: row.id,
            user_id: row.user_id,
            theme: row.theme.unwrap_or_default(),
            summary: row.summary,
            sample_comments,
            content_ideas,
            comment_count: i64::from(row.comment_count.unwrap_or(0)),
            primary_platform: row.primary_platform.as_deref().map(Platform::from_stored),
            platforms: row
                .platforms
                .iter()
                .map(|p| Platform::from_stored(p))
                .collect(),
            import_ids: row.import_ids,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ..Cluster::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns every active cluster for `user_id` in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_clusters(pool: &PgPool, user_id: Uuid) -> Result<Vec<ClusterRow>, DbError> {
    let rows = sqlx::query_as::<_, ClusterRow>(&format!(
        "SELECT {CLUSTER_COLUMNS} FROM clusters \
         WHERE user_id = $1 AND is_active = true \
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one cluster owned by `user_id`, active or not.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such cluster exists for the user, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_cluster(
    pool: &PgPool,
    user_id: Uuid,
    cluster_id: Uuid,
) -> Result<ClusterRow, DbError> {
    sqlx::query_as::<_, ClusterRow>(&format!(
        "SELECT {CLUSTER_COLUMNS} FROM clusters WHERE id = $1 AND user_id = $2"
    ))
    .bind(cluster_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Linked comments of one cluster sharing a platform and import.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClusterLinkCountRow {
    pub cluster_id: Uuid,
    pub platform: String,
    pub import_id: Option<Uuid>,
    pub comment_count: i64,
}

impl From<ClusterLinkCountRow> for LinkCount {
    fn from(row: ClusterLinkCountRow) -> Self {
        LinkCount {
            platform: Platform::from_stored(&row.platform),
            import_id: row.import_id,
            count: row.comment_count,
        }
    }
}

/// Counts the linked comments of every active cluster of `user_id`, grouped
/// by cluster, platform, and import.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cluster_link_counts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ClusterLinkCountRow>, DbError> {
    let rows = sqlx::query_as::<_, ClusterLinkCountRow>(
        "SELECT cc.cluster_id, c.platform, c.import_id, COUNT(*) AS comment_count \
         FROM cluster_comments cc \
         JOIN clusters k ON k.id = cc.cluster_id \
         JOIN comments c ON c.id = cc.comment_id \
         WHERE k.user_id = $1 AND k.is_active = true AND c.user_id = $1 \
         GROUP BY cc.cluster_id, c.platform, c.import_id \
         ORDER BY cc.cluster_id, c.platform, c.import_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// What one clustering run actually stored.
#[derive(Debug, Clone)]
pub struct StoredClusters {
    pub clusters: Vec<ClusterRow>,
    /// Comments this run flipped from unprocessed to processed.
    pub comments_claimed: usize,
}

/// Persists one clustering run.
///
/// First claims the comments in `processed_comment_ids` that are still
/// unprocessed, marking them processed. A comment already processed by a
/// concurrent run is not claimed, so it is never linked twice. Each cluster
/// is then inserted and linked to its claimed comments through
/// `cluster_comments` and `comments.cluster_id`. A cluster whose comments
/// were all claimed elsewhere is skipped. Only comments owned by `user_id`
/// are touched. All writes commit together.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn insert_generated_clusters(
    pool: &PgPool,
    user_id: Uuid,
    clusters: &[NewCluster],
    processed_comment_ids: &[Uuid],
) -> Result<StoredClusters, DbError> {
    let mut tx = pool.begin().await?;

    // Locks are taken in id order. A concurrent claim waits on them, then
    // re-checks is_processed and skips what the other run took.
    let claimed: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
        "WITH claim AS ( \
             SELECT id FROM comments \
             WHERE id = ANY($1) AND user_id = $2 AND is_processed = false \
             ORDER BY id \
             FOR UPDATE \
         ) \
         UPDATE comments c SET is_processed = true \
         FROM claim WHERE c.id = claim.id \
         RETURNING c.id",
    )
    .bind(processed_comment_ids)
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .collect();

    if claimed.is_empty() && !processed_comment_ids.is_empty() {
        tx.rollback().await?;
        tracing::info!(
            user_id = %user_id,
            submitted = processed_comment_ids.len(),
            "no comments left to claim; clustering run discarded"
        );
        return Ok(StoredClusters {
            clusters: Vec::new(),
            comments_claimed: 0,
        });
    }

    let mut inserted = Vec::with_capacity(clusters.len());
    let mut skipped = 0_usize;

    for cluster in clusters {
        let comment_ids: Vec<Uuid> = cluster
            .comment_ids
            .iter()
            .copied()
            .filter(|id| claimed.contains(id))
            .collect();
        if comment_ids.is_empty() && !cluster.comment_ids.is_empty() {
            skipped += 1;
            continue;
        }

        let platforms: Vec<String> = cluster
            .platforms
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        let comment_count = if comment_ids.len() < cluster.comment_ids.len() {
            i64::try_from(comment_ids.len()).unwrap_or(i64::MAX)
        } else {
            cluster.comment_count.max(0)
        };
        let comment_count = i32::try_from(comment_count).unwrap_or(i32::MAX);

        let row = sqlx::query_as::<_, ClusterRow>(&format!(
            "INSERT INTO clusters \
                 (id, user_id, theme, summary, comment_count, sample_comments, content_ideas, \
                  primary_platform, platforms, import_ids, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, true) \
             RETURNING {CLUSTER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&cluster.theme)
        .bind(cluster.summary.as_deref())
        .bind(comment_count)
        .bind(Json(&cluster.sample_comments))
        .bind(Json(&cluster.content_ideas))
        .bind(cluster.primary_platform.map(Platform::as_str))
        .bind(&platforms)
        .bind(&cluster.import_ids)
        .fetch_one(&mut *tx)
        .await?;

        if !comment_ids.is_empty() {
            sqlx::query(
                "INSERT INTO cluster_comments (cluster_id, comment_id) \
                 SELECT $1, id FROM comments WHERE id = ANY($2) AND user_id = $3 \
                 ON CONFLICT DO NOTHING",
            )
            .bind(row.id)
            .bind(&comment_ids)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE comments SET cluster_id = $1 WHERE id = ANY($2) AND user_id = $3")
                .bind(row.id)
                .bind(&comment_ids)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        inserted.push(row);
    }

    tx.commit().await?;

    let comments_claimed = claimed.len();
    tracing::debug!(
        user_id = %user_id,
        clusters = inserted.len(),
        clusters_skipped = skipped,
        comments_claimed,
        "persisted generated clusters"
    );
    Ok(StoredClusters {
        clusters: inserted,
        comments_claimed,
    })
}

/// Deactivates every cluster of `user_id`, drops their `cluster_comments`
/// links, and clears `cluster_id` and `is_processed` on all of the user's
/// comments, in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is applied in
/// that case.
pub async fn reset_insights(pool: &PgPool, user_id: Uuid) -> Result<ResetOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let links_removed = sqlx::query(
        "DELETE FROM cluster_comments \
         WHERE cluster_id IN (SELECT id FROM clusters WHERE user_id = $1)",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let clusters_deactivated = sqlx::query(
        "UPDATE clusters SET is_active = false, updated_at = NOW() \
         WHERE user_id = $1 AND is_active = true",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let comments_reset = sqlx::query(
        "UPDATE comments SET cluster_id = NULL, is_processed = false WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::debug!(
        user_id = %user_id,
        clusters_deactivated,
        links_removed,
        comments_reset,
        "reset insights"
    );
    Ok(ResetOutcome {
        clusters_deactivated,
        comments_reset,
    })
}
