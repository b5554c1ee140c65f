//! Domain types, configuration, and the insight-cluster consolidation engine
//! for Inbox Brain.

pub mod app_config;
pub mod config;
pub mod insights;
pub mod model;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use insights::{
    available_imports, available_platforms, consolidate_clusters, filter_clusters,
    get_consolidated_clusters, load_consolidated_clusters, load_insights_summary,
    normalize_theme, reset_insights, summarize_insights, themes_are_similar, ClusterFilter,
    ConsolidatedClusters, ImportFacet, InsightsError, InsightsRepository, InsightsSummary,
    ResetOutcome, TopQuestion, MAX_CONTENT_IDEAS, MAX_SAMPLE_COMMENTS,
};
pub use model::{
    Cluster, Comment, CommentStats, ContentIdea, Import, LinkCount, NewCluster, Platform,
    Sentiment,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),

    #[error("invalid sentiment: {0}")]
    InvalidSentiment(String),

    #[error("invalid import id: {0}")]
    InvalidImportId(String),
}
