//! Offline consolidation of an exported cluster dump.

use std::path::Path;

use anyhow::Context;
use inbrain_core::{get_consolidated_clusters, Cluster, ClusterFilter, ConsolidatedClusters};

/// Read clusters from `input`, consolidate and filter them, and print the
/// view as pretty JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON array of
/// cluster records, or a filter value is invalid.
pub(crate) fn run_consolidate(
    input: &Path,
    platform: Option<&str>,
    import_id: Option<&str>,
) -> anyhow::Result<()> {
    let view = consolidate_file(input, platform, import_id)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub(crate) fn consolidate_file(
    input: &Path,
    platform: Option<&str>,
    import_id: Option<&str>,
) -> anyhow::Result<ConsolidatedClusters> {
    let filter = ClusterFilter::from_query(platform, import_id)?;
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let clusters: Vec<Cluster> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of clusters", input.display()))?;

    let raw_count = clusters.len();
    let view = get_consolidated_clusters(clusters, &filter, &[]);
    tracing::info!(
        input = %input.display(),
        raw_clusters = raw_count,
        consolidated = view.total_clusters,
        "consolidated cluster dump"
    );
    Ok(view)
}
