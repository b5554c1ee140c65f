//! Database operations for the `comments` table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use inbrain_core::{Comment, CommentStats, Platform, Sentiment};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

const COMMENT_COLUMNS: &str = "c.id, c.user_id, c.platform, c.content, c.author_name, \
     c.author_handle, c.post_url, c.post_title, c.sentiment, c.import_id, c.cluster_id, \
     c.is_processed, c.original_date, c.created_at";

/// A row from the `comments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub content: String,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub post_url: Option<String>,
    pub post_title: Option<String>,
    pub sentiment: Option<String>,
    pub import_id: Option<Uuid>,
    pub cluster_id: Option<Uuid>,
    pub is_processed: bool,
    pub original_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            user_id: row.user_id,
            platform: Platform::from_stored(&row.platform),
            content: row.content,
            author_name: row.author_name,
            author_handle: row.author_handle,
            post_url: row.post_url,
            post_title: row.post_title,
            sentiment: row.sentiment.and_then(|s| s.parse::<Sentiment>().ok()),
            import_id: row.import_id,
            cluster_id: row.cluster_id,
            is_processed: row.is_processed,
            original_date: row.original_date,
            created_at: row.created_at,
        }
    }
}

/// Fields for inserting a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: Uuid,
    pub platform: Platform,
    pub content: String,
    pub author_name: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub import_id: Option<Uuid>,
    pub original_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts one unprocessed comment and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_comment(pool: &PgPool, comment: &NewComment) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO comments \
             (id, user_id, platform, content, author_name, sentiment, import_id, original_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(id)
    .bind(comment.user_id)
    .bind(comment.platform.as_str())
    .bind(&comment.content)
    .bind(comment.author_name.as_deref())
    .bind(comment.sentiment.map(Sentiment::as_str))
    .bind(comment.import_id)
    .bind(comment.original_date)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Returns up to `limit` unprocessed comments for `user_id`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unprocessed_comments(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c \
         WHERE c.user_id = $1 AND c.is_processed = false \
         ORDER BY c.created_at ASC, c.id ASC \
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a page of the comments linked to one cluster, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cluster_comments(
    pool: &PgPool,
    user_id: Uuid,
    cluster_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c \
         JOIN cluster_comments cc ON cc.comment_id = c.id \
         WHERE cc.cluster_id = $1 AND c.user_id = $2 \
         ORDER BY c.created_at DESC, c.id ASC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(cluster_id)
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_cluster_comments(
    pool: &PgPool,
    user_id: Uuid,
    cluster_id: Uuid,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments c \
         JOIN cluster_comments cc ON cc.comment_id = c.id \
         WHERE cc.cluster_id = $1 AND c.user_id = $2",
    )
    .bind(cluster_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Aggregate counts for `user_id`: totals plus per-platform and per-sentiment
/// breakdowns. Unknown platform values are folded into `other`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn comment_stats(pool: &PgPool, user_id: Uuid) -> Result<CommentStats, DbError> {
    let (total, unprocessed) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_processed = false) \
         FROM comments WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let platform_rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT platform, COUNT(*) FROM comments WHERE user_id = $1 GROUP BY platform",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut by_platform = BTreeMap::new();
    for (platform, count) in platform_rows {
        *by_platform.entry(Platform::from_stored(&platform)).or_insert(0) += count;
    }

    let sentiment_rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT sentiment, COUNT(*) FROM comments \
         WHERE user_id = $1 AND sentiment IS NOT NULL GROUP BY sentiment",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let by_sentiment = sentiment_rows
        .into_iter()
        .filter_map(|(s, count)| s.parse::<Sentiment>().ok().map(|s| (s, count)))
        .collect();

    Ok(CommentStats {
        total,
        unprocessed,
        by_platform,
        by_sentiment,
    })
}

/// Users with at least `min_unprocessed` comments waiting to be clustered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_users_with_unprocessed(
    pool: &PgPool,
    min_unprocessed: i64,
) -> Result<Vec<Uuid>, DbError> {
    let users = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM comments \
         WHERE is_processed = false \
         GROUP BY user_id \
         HAVING COUNT(*) >= $1 \
         ORDER BY user_id",
    )
    .bind(min_unprocessed)
    .fetch_all(pool)
    .await?;

    Ok(users)
}
