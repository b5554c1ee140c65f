//! Insight cluster command handlers for the CLI.

mod generate;
mod query;

use clap::Subcommand;
use inbrain_clusterer::{ClusterRequest, DEFAULT_MIN_CLUSTER_SIZE, DEFAULT_NUM_CLUSTERS};
use inbrain_db::PgInsightsRepository;
use uuid::Uuid;

pub(crate) use generate::run_generate;
pub(crate) use query::{run_clusters, run_stats, run_summary};

/// Sub-commands available under `insights`.
#[derive(Debug, Subcommand)]
pub enum InsightsCommands {
    /// Show the consolidated cluster view
    Clusters {
        #[arg(long)]
        user: Uuid,

        /// Only show clusters that mention this platform
        #[arg(long)]
        platform: Option<String>,

        /// Only show clusters built from this import
        #[arg(long)]
        import_id: Option<String>,
    },
    /// Show comment counts by platform and sentiment
    Stats {
        #[arg(long)]
        user: Uuid,
    },
    /// Show the dashboard summary
    Summary {
        #[arg(long)]
        user: Uuid,
    },
    /// Deactivate all clusters and mark every comment unprocessed
    Reset {
        #[arg(long)]
        user: Uuid,
    },
    /// Cluster the user's unprocessed comments
    Generate {
        #[arg(long)]
        user: Uuid,

        #[arg(long, default_value_t = DEFAULT_NUM_CLUSTERS)]
        num_clusters: u32,

        #[arg(long, default_value_t = DEFAULT_MIN_CLUSTER_SIZE)]
        min_cluster_size: u32,
    },
}

/// Dispatch one `insights` sub-command.
///
/// # Errors
///
/// Returns an error if the underlying query or operation fails.
pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &inbrain_core::AppConfig,
    command: InsightsCommands,
) -> anyhow::Result<()> {
    match command {
        InsightsCommands::Clusters {
            user,
            platform,
            import_id,
        } => run_clusters(pool, user, platform.as_deref(), import_id.as_deref()).await,
        InsightsCommands::Stats { user } => run_stats(pool, user).await,
        InsightsCommands::Summary { user } => run_summary(pool, user).await,
        InsightsCommands::Reset { user } => run_reset(pool, user).await,
        InsightsCommands::Generate {
            user,
            num_clusters,
            min_cluster_size,
        } => {
            let request = ClusterRequest {
                num_clusters,
                min_cluster_size,
            };
            run_generate(pool, config, user, &request).await
        }
    }
}

async fn run_reset(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let repo = PgInsightsRepository::new(pool.clone());
    let outcome = inbrain_core::reset_insights(&repo, user_id).await?;
    println!(
        "reset complete: {} cluster(s) deactivated, {} comment(s) marked unprocessed",
        outcome.clusters_deactivated, outcome.comments_reset
    );
    Ok(())
}
