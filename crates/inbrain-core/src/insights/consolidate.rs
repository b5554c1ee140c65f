//! Read-time merge of near-duplicate clusters into one display record each.
//!
//! The merge is single-pass and first-match-wins: every incoming cluster is
//! compared against the representative theme of each existing group in the
//! order the groups were created, and joins the first one that matches. The
//! result therefore depends on input order; callers pass clusters in stored
//! order so repeated reads agree.

use crate::model::Cluster;

use super::theme::{normalize_theme, themes_are_similar};

/// Cap on sample comments kept per cluster.
pub const MAX_SAMPLE_COMMENTS: usize = 5;

/// Cap on content ideas kept per cluster.
pub const MAX_CONTENT_IDEAS: usize = 4;

/// Merge clusters with equivalent themes and sort by comment count, descending.
///
/// The first-seen cluster of each group keeps its id, theme, summary, and
/// primary platform. Counts and platform breakdowns are summed. Sample and
/// idea lists are concatenated in arrival order and truncated to their caps,
/// and platform and import sets are unioned. Ties in count keep their group
/// order.
///
/// Malformed records are sanitized rather than rejected: negative counts
/// clamp to zero and over-long lists are truncated.
#[must_use]
pub fn consolidate_clusters(clusters: Vec<Cluster>) -> Vec<Cluster> {
    let mut groups: Vec<(String, Cluster)> = Vec::new();

    for incoming in clusters {
        let incoming = sanitize(incoming);
        match groups
            .iter_mut()
            .find(|(key, _)| themes_are_similar(key, &incoming.theme))
        {
            Some((_, existing)) => merge_into(existing, incoming),
            None => groups.push((normalize_theme(&incoming.theme), incoming)),
        }
    }

    let mut merged: Vec<Cluster> = groups.into_iter().map(|(_, cluster)| cluster).collect();
    // Stable: equal counts stay in first-seen order.
    merged.sort_by(|a, b| b.comment_count.cmp(&a.comment_count));
    merged
}

fn sanitize(mut cluster: Cluster) -> Cluster {
    cluster.comment_count = cluster.comment_count.max(0);
    cluster.filtered_comment_count = cluster.filtered_comment_count.max(0);
    cluster.sample_comments.truncate(MAX_SAMPLE_COMMENTS);
    cluster.content_ideas.truncate(MAX_CONTENT_IDEAS);
    cluster.platforms = dedup_in_order(std::mem::take(&mut cluster.platforms));
    cluster.import_ids = dedup_in_order(std::mem::take(&mut cluster.import_ids));
    cluster
}

fn merge_into(existing: &mut Cluster, incoming: Cluster) {
    existing.comment_count = existing.comment_count.saturating_add(incoming.comment_count);
    existing.filtered_comment_count = existing
        .filtered_comment_count
        .saturating_add(incoming.filtered_comment_count);
    for (platform, count) in incoming.platform_breakdown {
        let slot = existing.platform_breakdown.entry(platform).or_insert(0);
        *slot = slot.saturating_add(count);
    }
    existing.link_counts.extend(incoming.link_counts);

    existing.sample_comments.extend(incoming.sample_comments);
    existing.sample_comments.truncate(MAX_SAMPLE_COMMENTS);

    existing.content_ideas.extend(incoming.content_ideas);
    existing.content_ideas.truncate(MAX_CONTENT_IDEAS);

    union_into(&mut existing.platforms, incoming.platforms);
    union_into(&mut existing.import_ids, incoming.import_ids);

    if existing.primary_platform.is_none() {
        existing.primary_platform = incoming.primary_platform;
    }
}

fn union_into<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn dedup_in_order<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    union_into(&mut out, items);
    out
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::{ContentIdea, Platform};

    fn cluster(theme: &str, count: i64) -> Cluster {
        serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "theme": theme,
            "comment_count": count,
        }))
        .expect("cluster fixture")
    }

    fn samples(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}-{i}")).collect()
    }

    fn idea(title: &str) -> ContentIdea {
        ContentIdea {
            title: title.to_string(),
            description: None,
            content_type: Some("video".to_string()),
            priority: None,
        }
    }

    fn total(clusters: &[Cluster]) -> i64 {
        clusters.iter().map(|c| c.comment_count).sum()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(consolidate_clusters(Vec::new()).is_empty());
    }

    #[test]
    fn case_variants_merge_and_first_theme_wins() {
        let out = consolidate_clusters(vec![
            cluster("Pricing Questions", 3),
            cluster("pricing questions", 2),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].theme, "Pricing Questions");
        assert_eq!(out[0].comment_count, 5);
    }

    #[test]
    fn first_seen_identity_and_summary_are_kept() {
        let mut first = cluster("Gear", 1);
        first.summary = Some("first".to_string());
        let first_id = first.id;
        let mut second = cluster("gear recommendations", 10);
        second.summary = Some("second".to_string());

        let out = consolidate_clusters(vec![first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, first_id);
        assert_eq!(out[0].summary.as_deref(), Some("first"));
        assert_eq!(out[0].theme, "Gear");
    }

    #[test]
    fn merge_order_dependence_is_locked_in() {
        let out = consolidate_clusters(vec![
            cluster("tiktok growth tips", 4),
            cluster("growth tips for creators", 3),
            cluster("tiktok questions", 2),
        ]);
        let themes: Vec<(&str, i64)> = out
            .iter()
            .map(|c| (c.theme.as_str(), c.comment_count))
            .collect();
        assert_eq!(
            themes,
            vec![("tiktok growth tips", 7), ("tiktok questions", 2)]
        );
    }

    #[test]
    fn comparison_uses_representative_key_not_merged_members() {
        // The third theme shares "brand" and "deals" with the second member but
        // nothing with the group key, so it starts its own group.
        let out = consolidate_clusters(vec![
            cluster("pricing questions", 1),
            cluster("questions about brand pricing deals", 1),
            cluster("brand deals advice", 1),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn count_is_conserved() {
        let input = vec![
            cluster("Pricing", 3),
            cluster("pricing questions", 4),
            cluster("Gear", 9),
            cluster("camera gear", 1),
            cluster("Editing", 0),
        ];
        let before = total(&input);
        let out = consolidate_clusters(input);
        assert_eq!(total(&out), before);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let out = consolidate_clusters(vec![cluster("Pricing", -4), cluster("pricing", 3)]);
        assert_eq!(out[0].comment_count, 3);
    }

    #[test]
    fn sample_cap_holds_after_merge() {
        let mut a = cluster("Pricing", 5);
        a.sample_comments = samples("a", 5);
        let mut b = cluster("pricing", 5);
        b.sample_comments = samples("b", 5);

        let out = consolidate_clusters(vec![a, b]);
        assert_eq!(out[0].sample_comments.len(), MAX_SAMPLE_COMMENTS);
        assert_eq!(out[0].sample_comments, samples("a", 5));
    }

    #[test]
    fn samples_fill_from_later_clusters_when_room_remains() {
        let mut a = cluster("Pricing", 2);
        a.sample_comments = samples("a", 2);
        let mut b = cluster("pricing", 2);
        b.sample_comments = samples("b", 4);

        let out = consolidate_clusters(vec![a, b]);
        assert_eq!(
            out[0].sample_comments,
            vec!["a-0", "a-1", "b-0", "b-1", "b-2"]
        );
    }

    #[test]
    fn content_idea_cap_holds_after_merge() {
        let mut a = cluster("Pricing", 1);
        a.content_ideas = vec![idea("a1"), idea("a2"), idea("a3")];
        let mut b = cluster("pricing", 1);
        b.content_ideas = vec![idea("b1"), idea("b2")];

        let out = consolidate_clusters(vec![a, b]);
        let titles: Vec<&str> = out[0]
            .content_ideas
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a1", "a2", "a3", "b1"]);
    }

    #[test]
    fn oversized_single_cluster_is_truncated() {
        let mut a = cluster("Pricing", 1);
        a.sample_comments = samples("a", 8);
        a.content_ideas = (0..6).map(|i| idea(&i.to_string())).collect();
        let out = consolidate_clusters(vec![a]);
        assert_eq!(out[0].sample_comments.len(), MAX_SAMPLE_COMMENTS);
        assert_eq!(out[0].content_ideas.len(), MAX_CONTENT_IDEAS);
    }

    #[test]
    fn platforms_and_imports_are_unioned_without_duplicates() {
        let import_a = Uuid::new_v4();
        let import_b = Uuid::new_v4();
        let mut a = cluster("Pricing", 1);
        a.platforms = vec![Platform::Instagram, Platform::Instagram];
        a.import_ids = vec![import_a];
        let mut b = cluster("pricing", 1);
        b.platforms = vec![Platform::Youtube, Platform::Instagram];
        b.import_ids = vec![import_a, import_b];

        let out = consolidate_clusters(vec![a, b]);
        assert_eq!(out[0].platforms, vec![Platform::Instagram, Platform::Youtube]);
        assert_eq!(out[0].import_ids, vec![import_a, import_b]);
    }

    #[test]
    fn missing_themes_merge_only_with_each_other() {
        let out = consolidate_clusters(vec![
            cluster("", 1),
            cluster("Pricing", 2),
            cluster("  ", 3),
        ]);
        assert_eq!(out.len(), 2);
        let blank = out.iter().find(|c| c.theme.trim().is_empty()).expect("blank group");
        assert_eq!(blank.comment_count, 4);
    }

    #[test]
    fn output_sorted_by_count_with_stable_ties() {
        let out = consolidate_clusters(vec![
            cluster("Editing", 2),
            cluster("Gear", 5),
            cluster("Pricing", 2),
        ]);
        let themes: Vec<&str> = out.iter().map(|c| c.theme.as_str()).collect();
        assert_eq!(themes, vec!["Gear", "Editing", "Pricing"]);
    }

    #[test]
    fn consolidation_is_idempotent() {
        let input = vec![
            cluster("tiktok growth tips", 4),
            cluster("growth tips for creators", 3),
            cluster("tiktok questions", 2),
            cluster("Pricing Questions", 3),
            cluster("pricing questions", 2),
            cluster("", 1),
        ];
        let once = consolidate_clusters(input);
        let twice = consolidate_clusters(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn primary_platform_is_backfilled_from_later_members() {
        let a = cluster("Pricing", 1);
        let mut b = cluster("pricing", 1);
        b.primary_platform = Some(Platform::Tiktok);
        let out = consolidate_clusters(vec![a, b]);
        assert_eq!(out[0].primary_platform, Some(Platform::Tiktok));
    }
}
