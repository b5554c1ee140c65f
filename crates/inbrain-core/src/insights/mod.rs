//! Insight-cluster consolidation: theme matching, merging, filtering,
//! facets, summaries, and the repository-backed service entry points.

mod consolidate;
mod filter;
mod repository;
mod service;
mod summary;
mod theme;

pub use consolidate::{consolidate_clusters, MAX_CONTENT_IDEAS, MAX_SAMPLE_COMMENTS};
pub use filter::{
    available_imports, available_platforms, filter_clusters, get_consolidated_clusters,
    ClusterFilter, ConsolidatedClusters, ImportFacet,
};
pub use repository::{InsightsRepository, ResetOutcome};
pub use service::{
    load_consolidated_clusters, load_insights_summary, reset_insights, InsightsError,
};
pub use summary::{summarize_insights, InsightsSummary, TopQuestion};
pub use theme::{normalize_theme, themes_are_similar};
