//! Dashboard summary built from the consolidated clusters and comment stats.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Cluster, CommentStats, ContentIdea, Sentiment};

use super::consolidate::consolidate_clusters;

const TOP_CLUSTERS: usize = 5;
const TOP_QUESTIONS: usize = 5;
const IDEAS_PER_CLUSTER: usize = 2;
const MAX_IDEAS: usize = 10;

const QUESTION_PREFIXES: [&str; 9] = [
    "how", "what", "why", "when", "where", "who", "can", "do", "is",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopQuestion {
    pub question: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsSummary {
    pub total_comments: i64,
    pub processed_comments: i64,
    pub clusters_count: usize,
    pub top_clusters: Vec<Cluster>,
    pub top_questions: Vec<TopQuestion>,
    pub content_ideas: Vec<ContentIdea>,
    pub sentiment_breakdown: BTreeMap<Sentiment, i64>,
}

/// Summarize a user's active clusters for the dashboard.
#[must_use]
pub fn summarize_insights(clusters: Vec<Cluster>, stats: &CommentStats) -> InsightsSummary {
    let mut top_clusters =
        consolidate_clusters(clusters.into_iter().filter(|c| c.is_active).collect());
    top_clusters.truncate(TOP_CLUSTERS);

    let top_questions = top_clusters
        .iter()
        .filter(|c| looks_like_question(&c.theme))
        .take(TOP_QUESTIONS)
        .map(|c| TopQuestion {
            question: c.theme.clone(),
            count: c.comment_count,
        })
        .collect();

    let content_ideas = top_clusters
        .iter()
        .flat_map(|c| c.content_ideas.iter().take(IDEAS_PER_CLUSTER).cloned())
        .take(MAX_IDEAS)
        .collect();

    InsightsSummary {
        total_comments: stats.total,
        processed_comments: stats.processed(),
        clusters_count: top_clusters.len(),
        top_clusters,
        top_questions,
        content_ideas,
        sentiment_breakdown: stats.by_sentiment.clone(),
    }
}

/// A theme reads as a question if it has a `?` or opens with a question word.
///
/// The prefix check is a plain `starts_with`, so "Island life" also counts.
fn looks_like_question(theme: &str) -> bool {
    let lowered = theme.trim().to_lowercase();
    lowered.contains('?')
        || QUESTION_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn cluster(theme: &str, count: i64, ideas: &[&str]) -> Cluster {
        let mut c: Cluster = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "theme": theme,
            "comment_count": count,
        }))
        .expect("cluster fixture");
        c.content_ideas = ideas
            .iter()
            .map(|t| ContentIdea {
                title: (*t).to_string(),
                description: None,
                content_type: None,
                priority: None,
            })
            .collect();
        c
    }

    #[test]
    fn question_detection() {
        assert!(looks_like_question("How do I start?"));
        assert!(looks_like_question("What camera do you use"));
        assert!(looks_like_question("Gear questions?"));
        assert!(!looks_like_question("Pricing feedback"));
    }

    #[test]
    fn summary_collects_questions_ideas_and_stats() {
        let mut stats = CommentStats {
            total: 40,
            unprocessed: 10,
            ..CommentStats::default()
        };
        stats.by_sentiment.insert(Sentiment::Question, 7);

        let summary = summarize_insights(
            vec![
                cluster("How to price sponsorships", 9, &["a", "b", "c"]),
                cluster("Gear", 12, &["d"]),
                cluster("What editing app", 3, &[]),
            ],
            &stats,
        );

        assert_eq!(summary.total_comments, 40);
        assert_eq!(summary.processed_comments, 30);
        assert_eq!(summary.clusters_count, 3);
        assert_eq!(summary.top_clusters[0].theme, "Gear");
        let questions: Vec<&str> = summary
            .top_questions
            .iter()
            .map(|q| q.question.as_str())
            .collect();
        assert_eq!(questions, vec!["How to price sponsorships", "What editing app"]);
        let ideas: Vec<&str> = summary.content_ideas.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(ideas, vec!["d", "a", "b"]);
        assert_eq!(summary.sentiment_breakdown.get(&Sentiment::Question), Some(&7));
    }

    #[test]
    fn summary_caps_clusters_and_ideas() {
        let clusters = (0..8)
            .map(|i| cluster(&format!("topic{i}"), 10 - i, &["x", "y", "z"]))
            .collect();
        let summary = summarize_insights(clusters, &CommentStats::default());
        assert_eq!(summary.top_clusters.len(), TOP_CLUSTERS);
        assert_eq!(summary.content_ideas.len(), MAX_IDEAS);
    }
}
