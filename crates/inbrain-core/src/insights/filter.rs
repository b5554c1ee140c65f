//! Platform/import filtering and facet computation for the cluster view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Cluster, Import, LinkCount, Platform};
use crate::CoreError;

use super::consolidate::consolidate_clusters;

/// Narrowing applied to the cluster view. `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterFilter {
    pub platform: Option<Platform>,
    pub import_id: Option<Uuid>,
}

impl ClusterFilter {
    /// Build a filter from raw query values. Absent, empty, or `all` values
    /// select everything.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPlatform`] or [`CoreError::InvalidImportId`]
    /// if a value is present but unparseable.
    pub fn from_query(platform: Option<&str>, import_id: Option<&str>) -> Result<Self, CoreError> {
        let platform = selected(platform).map(str::parse::<Platform>).transpose()?;
        let import_id = selected(import_id)
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| CoreError::InvalidImportId(raw.to_string()))
            })
            .transpose()?;
        Ok(Self {
            platform,
            import_id,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platform.is_none() && self.import_id.is_none()
    }

    #[must_use]
    pub fn matches(&self, cluster: &Cluster) -> bool {
        let platform_ok = self
            .platform
            .is_none_or(|platform| cluster.mentions_platform(platform));
        let import_ok = self
            .import_id
            .is_none_or(|import_id| cluster.import_ids.contains(&import_id));
        platform_ok && import_ok
    }

    fn matches_link(&self, link: &LinkCount) -> bool {
        self.platform.is_none_or(|platform| link.platform == platform)
            && self.import_id.is_none_or(|import_id| link.import_id == Some(import_id))
    }

    /// Comments of `cluster` that fall under this filter, or `None` if the
    /// cluster has none.
    ///
    /// With link data the count comes from the linked comments themselves.
    /// Without it the cluster's stored facets decide membership and the
    /// stored count is reported whole.
    #[must_use]
    pub fn filtered_count(&self, cluster: &Cluster) -> Option<i64> {
        let total = cluster.comment_count.max(0);
        if self.is_empty() {
            return Some(total);
        }
        if cluster.link_counts.is_empty() {
            return self.matches(cluster).then_some(total);
        }
        let matched: i64 = cluster
            .link_counts
            .iter()
            .filter(|link| self.matches_link(link))
            .map(|link| link.count.max(0))
            .sum();
        (matched > 0).then_some(matched)
    }
}

fn selected(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// An import offered as a filter option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFacet {
    pub id: Uuid,
    pub name: String,
    pub platform: Platform,
    pub comment_count: i64,
}

impl From<&Import> for ImportFacet {
    fn from(import: &Import) -> Self {
        Self {
            id: import.id,
            name: import.name.clone(),
            platform: import.platform,
            comment_count: import.comment_count,
        }
    }
}

/// The consolidated, filtered cluster view returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedClusters {
    pub clusters: Vec<Cluster>,
    pub total_clusters: usize,
    pub available_platforms: Vec<Platform>,
    pub available_imports: Vec<ImportFacet>,
    pub filter_applied: ClusterFilter,
}

/// Keep clusters with at least one comment under `filter`, recording that
/// count in `filtered_comment_count` and the per-platform split of linked
/// comments in `platform_breakdown`. Order is preserved.
///
/// For clusters without link data, a platform filter matches either the
/// platform set or the primary platform, since stored clusters may populate
/// only one of the two.
#[must_use]
pub fn filter_clusters(clusters: Vec<Cluster>, filter: &ClusterFilter) -> Vec<Cluster> {
    clusters
        .into_iter()
        .filter_map(|mut cluster| {
            cluster.filtered_comment_count = filter.filtered_count(&cluster)?;
            cluster.platform_breakdown = platform_breakdown(&cluster.link_counts);
            Some(cluster)
        })
        .collect()
}

fn platform_breakdown(links: &[LinkCount]) -> BTreeMap<Platform, i64> {
    let mut breakdown = BTreeMap::new();
    for link in links {
        *breakdown.entry(link.platform).or_insert(0) += link.count.max(0);
    }
    breakdown
}

/// Every platform represented by any of the given clusters, including through
/// linked comments, sorted by name.
#[must_use]
pub fn available_platforms(clusters: &[Cluster]) -> Vec<Platform> {
    let mut platforms: Vec<Platform> = Vec::new();
    let mentioned = clusters
        .iter()
        .flat_map(|c| {
            c.platforms
                .iter()
                .copied()
                .chain(c.primary_platform)
                .chain(c.link_counts.iter().map(|link| link.platform))
        });
    for platform in mentioned {
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    platforms.sort_by_key(|p| p.as_str());
    platforms
}

/// Import facets straight from the user's imports, so imports with no
/// clusters yet remain selectable.
#[must_use]
pub fn available_imports(imports: &[Import]) -> Vec<ImportFacet> {
    imports.iter().map(ImportFacet::from).collect()
}

/// Build the cluster view: facets from the full active set, then filter the
/// granular clusters, then consolidate the filtered subset so counts only
/// reflect the selected population. Clusters are ordered by
/// `filtered_comment_count`, descending.
#[must_use]
pub fn get_consolidated_clusters(
    raw_clusters: Vec<Cluster>,
    filter: &ClusterFilter,
    imports: &[Import],
) -> ConsolidatedClusters {
    let active: Vec<Cluster> = raw_clusters.into_iter().filter(|c| c.is_active).collect();
    let available_platforms = available_platforms(&active);
    let mut clusters = consolidate_clusters(filter_clusters(active, filter));
    clusters.sort_by(|a, b| b.filtered_comment_count.cmp(&a.filtered_comment_count));

    ConsolidatedClusters {
        total_clusters: clusters.len(),
        clusters,
        available_platforms,
        available_imports: available_imports(imports),
        filter_applied: *filter,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn cluster(theme: &str, count: i64, platforms: &[Platform]) -> Cluster {
        let mut c: Cluster = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "theme": theme,
            "comment_count": count,
        }))
        .expect("cluster fixture");
        c.platforms = platforms.to_vec();
        c
    }

    fn import(name: &str, platform: Platform, count: i64) -> Import {
        Import {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            platform,
            comment_count: count,
            created_at: Utc::now(),
        }
    }

    fn themes(clusters: &[Cluster]) -> Vec<&str> {
        clusters.iter().map(|c| c.theme.as_str()).collect()
    }

    #[test]
    fn no_filter_passes_everything_through() {
        let input = vec![
            cluster("A", 1, &[Platform::Instagram]),
            cluster("B", 1, &[]),
        ];
        let out = filter_clusters(input, &ClusterFilter::default());
        assert_eq!(themes(&out), vec!["A", "B"]);
        assert!(out.iter().all(|c| c.filtered_comment_count == 1));
    }

    #[test]
    fn platform_filter_uses_platform_set() {
        let input = vec![
            cluster("A", 1, &[Platform::Instagram]),
            cluster("B", 1, &[Platform::Youtube, Platform::Instagram]),
        ];

        let youtube = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: None,
        };
        assert_eq!(themes(&filter_clusters(input.clone(), &youtube)), vec!["B"]);

        let instagram = ClusterFilter {
            platform: Some(Platform::Instagram),
            import_id: None,
        };
        assert_eq!(
            themes(&filter_clusters(input, &instagram)),
            vec!["A", "B"]
        );
    }

    #[test]
    fn platform_filter_also_checks_primary_platform() {
        let mut only_primary = cluster("A", 1, &[]);
        only_primary.primary_platform = Some(Platform::Tiktok);
        let filter = ClusterFilter {
            platform: Some(Platform::Tiktok),
            import_id: None,
        };
        assert_eq!(themes(&filter_clusters(vec![only_primary], &filter)), vec!["A"]);
    }

    #[test]
    fn import_filter_and_platform_filter_combine_with_and() {
        let wanted = Uuid::new_v4();
        let mut a = cluster("A", 1, &[Platform::Youtube]);
        a.import_ids = vec![wanted];
        let mut b = cluster("B", 1, &[Platform::Instagram]);
        b.import_ids = vec![wanted];
        let c = cluster("C", 1, &[Platform::Youtube]);

        let filter = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: Some(wanted),
        };
        assert_eq!(themes(&filter_clusters(vec![a, b, c], &filter)), vec!["A"]);
    }

    #[test]
    fn from_query_treats_all_and_empty_as_unfiltered() {
        let filter = ClusterFilter::from_query(Some("all"), Some("")).expect("filter");
        assert!(filter.is_empty());
        let filter = ClusterFilter::from_query(None, None).expect("filter");
        assert!(filter.is_empty());
    }

    #[test]
    fn from_query_parses_values() {
        let id = Uuid::new_v4();
        let filter =
            ClusterFilter::from_query(Some("YouTube"), Some(&id.to_string())).expect("filter");
        assert_eq!(filter.platform, Some(Platform::Youtube));
        assert_eq!(filter.import_id, Some(id));
    }

    #[test]
    fn from_query_rejects_bad_values() {
        assert!(matches!(
            ClusterFilter::from_query(Some("myspace"), None),
            Err(CoreError::InvalidPlatform(_))
        ));
        assert!(matches!(
            ClusterFilter::from_query(None, Some("not-a-uuid")),
            Err(CoreError::InvalidImportId(_))
        ));
    }

    #[test]
    fn available_platforms_unions_sets_and_primary() {
        let mut a = cluster("A", 1, &[Platform::Youtube, Platform::Instagram]);
        a.primary_platform = Some(Platform::Youtube);
        let mut b = cluster("B", 1, &[]);
        b.primary_platform = Some(Platform::Email);
        let c = cluster("C", 1, &[Platform::Instagram]);

        assert_eq!(
            available_platforms(&[a, b, c]),
            vec![Platform::Email, Platform::Instagram, Platform::Youtube]
        );
    }

    #[test]
    fn available_imports_include_unclustered_imports() {
        let imports = vec![
            import("Launch video", Platform::Youtube, 120),
            import("Giveaway post", Platform::Instagram, 0),
        ];
        let facets = available_imports(&imports);
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[1].name, "Giveaway post");
        assert_eq!(facets[1].comment_count, 0);
    }

    #[test]
    fn filtered_counts_do_not_leak_unfiltered_totals() {
        // Both clusters share a theme, but only one came from YouTube.
        let input = vec![
            cluster("Pricing", 3, &[Platform::Youtube]),
            cluster("pricing", 10, &[Platform::Instagram]),
        ];
        let filter = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: None,
        };
        let view = get_consolidated_clusters(input, &filter, &[]);
        assert_eq!(view.total_clusters, 1);
        assert_eq!(view.clusters[0].comment_count, 3);
        assert_eq!(
            view.available_platforms,
            vec![Platform::Instagram, Platform::Youtube]
        );
        assert_eq!(view.filter_applied, filter);
    }

    #[test]
    fn inactive_clusters_are_excluded_from_view_and_facets() {
        let mut stale = cluster("Old theme", 9, &[Platform::Email]);
        stale.is_active = false;
        let live = cluster("Pricing", 2, &[Platform::Youtube]);

        let view = get_consolidated_clusters(vec![stale, live], &ClusterFilter::default(), &[]);
        assert_eq!(themes(&view.clusters), vec!["Pricing"]);
        assert_eq!(view.available_platforms, vec![Platform::Youtube]);
    }

    #[test]
    fn empty_input_yields_empty_view() {
        let imports = vec![import("Batch", Platform::Tiktok, 4)];
        let view = get_consolidated_clusters(Vec::new(), &ClusterFilter::default(), &imports);
        assert!(view.clusters.is_empty());
        assert_eq!(view.total_clusters, 0);
        assert!(view.available_platforms.is_empty());
        assert_eq!(view.available_imports.len(), 1);
    }

    fn link(platform: Platform, import_id: Option<Uuid>, count: i64) -> LinkCount {
        LinkCount {
            platform,
            import_id,
            count,
        }
    }

    #[test]
    fn mixed_cluster_reports_only_filtered_platform_count() {
        let mut mixed = cluster("Gear", 5, &[Platform::Youtube, Platform::Instagram]);
        mixed.link_counts = vec![
            link(Platform::Youtube, None, 2),
            link(Platform::Instagram, None, 3),
        ];
        let filter = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: None,
        };

        let view = get_consolidated_clusters(vec![mixed], &filter, &[]);
        assert_eq!(view.total_clusters, 1);
        let gear = &view.clusters[0];
        assert_eq!(gear.filtered_comment_count, 2);
        assert_eq!(gear.comment_count, 5);
        assert_eq!(gear.platform_breakdown.get(&Platform::Youtube), Some(&2));
        assert_eq!(gear.platform_breakdown.get(&Platform::Instagram), Some(&3));
    }

    #[test]
    fn import_filter_counts_only_that_imports_comments() {
        let launch = Uuid::new_v4();
        let mut mixed = cluster("Pricing", 4, &[Platform::Youtube]);
        mixed.import_ids = vec![launch];
        mixed.link_counts = vec![
            link(Platform::Youtube, Some(launch), 1),
            link(Platform::Youtube, None, 3),
        ];
        let filter = ClusterFilter {
            platform: None,
            import_id: Some(launch),
        };

        let view = get_consolidated_clusters(vec![mixed], &filter, &[]);
        assert_eq!(view.clusters[0].filtered_comment_count, 1);
    }

    #[test]
    fn linked_cluster_without_matching_comments_is_dropped() {
        // Stored facets claim TikTok, but no linked comment came from there.
        let mut stale = cluster("Editing", 2, &[Platform::Tiktok]);
        stale.link_counts = vec![link(Platform::Email, None, 2)];
        let filter = ClusterFilter {
            platform: Some(Platform::Tiktok),
            import_id: None,
        };
        assert!(filter_clusters(vec![stale], &filter).is_empty());
    }

    #[test]
    fn filtered_view_is_ordered_by_filtered_count() {
        let mut big_overall =
            cluster("Lighting", 10, &[Platform::Youtube, Platform::Instagram]);
        big_overall.link_counts = vec![
            link(Platform::Youtube, None, 1),
            link(Platform::Instagram, None, 9),
        ];
        let mut youtube_heavy = cluster("Audio", 4, &[Platform::Youtube]);
        youtube_heavy.link_counts = vec![link(Platform::Youtube, None, 4)];
        let filter = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: None,
        };

        let view = get_consolidated_clusters(vec![big_overall, youtube_heavy], &filter, &[]);
        assert_eq!(themes(&view.clusters), vec!["Audio", "Lighting"]);
        let counts: Vec<i64> = view
            .clusters
            .iter()
            .map(|c| c.filtered_comment_count)
            .collect();
        assert_eq!(counts, vec![4, 1]);
    }

    #[test]
    fn merged_clusters_sum_filtered_counts() {
        let mut a = cluster("Pricing", 3, &[Platform::Youtube, Platform::Instagram]);
        a.link_counts = vec![
            link(Platform::Youtube, None, 1),
            link(Platform::Instagram, None, 2),
        ];
        let mut b = cluster("pricing", 2, &[Platform::Youtube]);
        b.link_counts = vec![link(Platform::Youtube, None, 2)];
        let filter = ClusterFilter {
            platform: Some(Platform::Youtube),
            import_id: None,
        };

        let view = get_consolidated_clusters(vec![a, b], &filter, &[]);
        assert_eq!(view.total_clusters, 1);
        assert_eq!(view.clusters[0].filtered_comment_count, 3);
        assert_eq!(view.clusters[0].comment_count, 5);
        assert_eq!(
            view.clusters[0].platform_breakdown.get(&Platform::Youtube),
            Some(&3)
        );
    }
}
