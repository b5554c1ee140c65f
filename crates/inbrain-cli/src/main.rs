mod consolidate;
mod insights;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::insights::InsightsCommands;

#[derive(Debug, Parser)]
#[command(name = "inbrain-cli")]
#[command(about = "Inbox Brain command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Consolidate a JSON dump of cluster records without a database
    Consolidate {
        /// Path to a JSON array of cluster records
        #[arg(long)]
        input: PathBuf,

        /// Only keep clusters that mention this platform (`all` for no filter)
        #[arg(long)]
        platform: Option<String>,

        /// Only keep clusters built from this import (`all` for no filter)
        #[arg(long)]
        import_id: Option<String>,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Insight cluster queries and operations for one user
    Insights {
        #[command(subcommand)]
        command: InsightsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // `consolidate` runs without DATABASE_URL, so the level is read directly.
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        let level = std::env::var("INBRAIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(level)
    })?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Consolidate {
            input,
            platform,
            import_id,
        }) => consolidate::run_consolidate(&input, platform.as_deref(), import_id.as_deref())?,
        Some(Commands::Db { command }) => {
            let config = inbrain_core::load_app_config()?;
            let pool = inbrain_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    inbrain_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = inbrain_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Some(Commands::Insights { command }) => {
            let config = inbrain_core::load_app_config()?;
            let pool = inbrain_db::connect_pool_from_config(&config).await?;
            insights::run(&pool, &config, command).await?;
        }
        None => println!("inbrain-cli: run with --help to list commands"),
    }

    Ok(())
}
