//! Database operations for the `imports` table.

use chrono::{DateTime, Utc};
use inbrain_core::{Import, Platform};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `imports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub platform: String,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ImportRow> for Import {
    fn from(row: ImportRow) -> Self {
        Import {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            platform: Platform::from_stored(&row.platform),
            comment_count: i64::from(row.comment_count.max(0)),
            created_at: row.created_at,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_import(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    platform: Platform,
    comment_count: i32,
) -> Result<ImportRow, DbError> {
    let row = sqlx::query_as::<_, ImportRow>(
        "INSERT INTO imports (id, user_id, name, platform, comment_count) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, user_id, name, platform, comment_count, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(platform.as_str())
    .bind(comment_count)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the user's imports, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_imports(pool: &PgPool, user_id: Uuid) -> Result<Vec<ImportRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportRow>(
        "SELECT id, user_id, name, platform, comment_count, created_at \
         FROM imports \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
