//! Tie proposed themes back to the comments they came from.

use std::collections::HashMap;

use inbrain_core::{Comment, ContentIdea, NewCluster, Platform};
use uuid::Uuid;

const MAX_SAMPLES: usize = 5;
const MAX_IDEAS: usize = 4;
const FALLBACK_THEME: &str = "Theme";
const DEFAULT_CONTENT_TYPE: &str = "video";

/// Turn every proposal into a [`NewCluster`] against the batch of comments
/// that was sent to the model. Index `i` in a proposal refers to
/// `comments[i]`.
#[must_use]
pub fn assemble_clusters(
    proposals: Vec<crate::ProposedCluster>,
    comments: &[Comment],
) -> Vec<NewCluster> {
    proposals
        .into_iter()
        .map(|proposal| assemble_cluster(proposal, comments))
        .collect()
}

fn assemble_cluster(proposal: crate::ProposedCluster, comments: &[Comment]) -> NewCluster {
    let sample_texts: Vec<String> = proposal
        .sample_comments
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    let mut members = members_by_index(&proposal.sample_comment_indices, comments);
    if members.is_empty() {
        members = members_by_text(&sample_texts, comments);
    }

    let comment_count = if members.is_empty() {
        sample_texts.len()
    } else {
        members.len()
    };

    let mut platforms: Vec<Platform> = Vec::new();
    let mut import_ids: Vec<Uuid> = Vec::new();
    for comment in &members {
        if !platforms.contains(&comment.platform) {
            platforms.push(comment.platform);
        }
        if let Some(import_id) = comment.import_id {
            if !import_ids.contains(&import_id) {
                import_ids.push(import_id);
            }
        }
    }

    let theme = proposal
        .theme
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_THEME.to_string());

    NewCluster {
        theme,
        summary: proposal.summary,
        sample_comments: members
            .iter()
            .take(MAX_SAMPLES)
            .map(|c| c.content.clone())
            .collect(),
        content_ideas: proposal
            .content_ideas
            .iter()
            .filter_map(content_idea)
            .take(MAX_IDEAS)
            .collect(),
        comment_count: i64::try_from(comment_count).unwrap_or(i64::MAX),
        primary_platform: primary_platform(&members),
        platforms,
        import_ids,
        comment_ids: members.iter().map(|c| c.id).collect(),
    }
}

/// Valid, distinct indices in the order given. Anything that is not a
/// non-negative in-range integer is skipped.
fn members_by_index<'a>(indices: &[serde_json::Value], comments: &'a [Comment]) -> Vec<&'a Comment> {
    let mut members: Vec<&Comment> = Vec::new();
    for index in indices.iter().filter_map(serde_json::Value::as_u64) {
        let Some(comment) = usize::try_from(index).ok().and_then(|i| comments.get(i)) else {
            continue;
        };
        if !members.iter().any(|m| m.id == comment.id) {
            members.push(comment);
        }
    }
    members
}

/// For each of the first few sample texts, the first comment whose content
/// contains it or is contained by it (case-insensitive).
fn members_by_text<'a>(samples: &[String], comments: &'a [Comment]) -> Vec<&'a Comment> {
    let lowered: Vec<String> = comments.iter().map(|c| c.content.to_lowercase()).collect();
    let mut members: Vec<&Comment> = Vec::new();
    for sample in samples.iter().take(MAX_SAMPLES) {
        let needle = sample.to_lowercase();
        let hit = comments
            .iter()
            .zip(&lowered)
            .find(|(_, content)| content.contains(&needle) || needle.contains(content.as_str()));
        if let Some((comment, _)) = hit {
            if !members.iter().any(|m| m.id == comment.id) {
                members.push(comment);
            }
        }
    }
    members
}

/// Most common platform among members; ties go to the one seen first.
fn primary_platform(members: &[&Comment]) -> Option<Platform> {
    let mut counts: HashMap<Platform, usize> = HashMap::new();
    let mut order: Vec<Platform> = Vec::new();
    for comment in members {
        let count = counts.entry(comment.platform).or_insert(0);
        if *count == 0 {
            order.push(comment.platform);
        }
        *count += 1;
    }

    let mut best: Option<(Platform, usize)> = None;
    for platform in order {
        let count = counts.get(&platform).copied().unwrap_or(0);
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((platform, count));
        }
    }
    best.map(|(platform, _)| platform)
}

fn content_idea(raw: &serde_json::Value) -> Option<ContentIdea> {
    let obj = raw.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };
    let priority = obj
        .get("priority")
        .and_then(serde_json::Value::as_i64)
        .and_then(|p| i32::try_from(p).ok());

    Some(ContentIdea {
        title: text("title").unwrap_or_default(),
        description: text("description"),
        content_type: Some(text("content_type").unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())),
        priority,
    })
}
