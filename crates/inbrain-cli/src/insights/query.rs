//! Read-only insight query handlers.

use inbrain_core::{ClusterFilter, Platform};
use inbrain_db::PgInsightsRepository;
use uuid::Uuid;

fn platform_list(platforms: &[Platform]) -> String {
    if platforms.is_empty() {
        return "-".to_string();
    }
    platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Print the consolidated cluster view for a user.
///
/// # Errors
///
/// Returns an error if a filter value is invalid or a query fails.
pub(crate) async fn run_clusters(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    platform: Option<&str>,
    import_id: Option<&str>,
) -> anyhow::Result<()> {
    let filter = ClusterFilter::from_query(platform, import_id)?;
    let repo = PgInsightsRepository::new(pool.clone());
    let view = inbrain_core::load_consolidated_clusters(&repo, user_id, &filter).await?;

    if view.clusters.is_empty() {
        println!("no clusters found; run `insights generate` first");
        return Ok(());
    }

    println!("{:<45}{:<10}PLATFORMS", "THEME", "COMMENTS");
    for cluster in &view.clusters {
        println!(
            "{:<45}{:<10}{}",
            cluster.theme,
            cluster.filtered_comment_count,
            platform_list(&cluster.platforms)
        );
    }
    println!();
    println!(
        "{} cluster(s); platforms available: {}; imports available: {}",
        view.total_clusters,
        platform_list(&view.available_platforms),
        view.available_imports.len()
    );

    Ok(())
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let stats = inbrain_db::comment_stats(pool, user_id).await?;

    println!(
        "total: {}  unprocessed: {}  processed: {}",
        stats.total,
        stats.unprocessed,
        stats.processed()
    );
    if !stats.by_platform.is_empty() {
        println!();
        println!("{:<15}COMMENTS", "PLATFORM");
        for (platform, count) in &stats.by_platform {
            println!("{:<15}{}", platform.as_str(), count);
        }
    }
    if !stats.by_sentiment.is_empty() {
        println!();
        println!("{:<15}COMMENTS", "SENTIMENT");
        for (sentiment, count) in &stats.by_sentiment {
            println!("{:<15}{}", sentiment.as_str(), count);
        }
    }

    Ok(())
}

/// Print the dashboard summary as a markdown report.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_summary(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let repo = PgInsightsRepository::new(pool.clone());
    let summary = inbrain_core::load_insights_summary(&repo, user_id).await?;

    println!("# Insights Summary");
    println!();
    println!("**User**: {user_id}");
    println!(
        "**Comments**: {} ({} processed)",
        summary.total_comments, summary.processed_comments
    );
    println!("**Clusters**: {}", summary.clusters_count);
    println!();

    println!("## Top clusters");
    println!();
    println!("| Theme | Comments |");
    println!("|-------|----------|");
    for cluster in &summary.top_clusters {
        println!("| {} | {} |", cluster.theme, cluster.comment_count);
    }

    if !summary.top_questions.is_empty() {
        println!();
        println!("## Top questions");
        println!();
        for question in &summary.top_questions {
            println!("- {} ({})", question.question, question.count);
        }
    }

    if !summary.content_ideas.is_empty() {
        println!();
        println!("## Content ideas");
        println!();
        for idea in &summary.content_ideas {
            let kind = idea.content_type.as_deref().unwrap_or("video");
            println!("- [{kind}] {}", idea.title);
        }
    }

    Ok(())
}
