use anyhow::Context;
use inbrain_clusterer::{run_clustering, ClusterRequest, ClustererClient, MAX_COMMENTS_PER_RUN};
use inbrain_core::Comment;
use uuid::Uuid;

/// Run one clustering pass for a user and persist the result.
///
/// # Errors
///
/// Returns an error if no clustering key is configured, the request is out
/// of range, too few comments are unprocessed, the clustering service fails,
/// or the clusters cannot be stored.
pub(crate) async fn run_generate(
    pool: &sqlx::PgPool,
    config: &inbrain_core::AppConfig,
    user_id: Uuid,
    request: &ClusterRequest,
) -> anyhow::Result<()> {
    request.validate()?;
    let client = ClustererClient::from_app_config(config)?
        .context("GROQ_API_KEY is not set; cluster generation is unavailable")?;

    let limit = i64::try_from(MAX_COMMENTS_PER_RUN).unwrap_or(i64::MAX);
    let comments: Vec<Comment> = inbrain_db::list_unprocessed_comments(pool, user_id, limit)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect();
    println!("clustering {} unprocessed comment(s)", comments.len());

    let outcome = run_clustering(&client, comments, request).await?;
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

    println!("{:<45}COMMENTS", "THEME");
    for row in &stored.clusters {
        println!(
            "{:<45}{}",
            row.theme.as_deref().unwrap_or_default(),
            row.comment_count.unwrap_or_default()
        );
    }
    println!(
        "created {} cluster(s); {} comment(s) marked processed",
        stored.clusters.len(),
        stored.comments_claimed
    );
    Ok(())
}
