//! Prompt construction and response parsing.

use std::fmt::Write as _;

use inbrain_core::Comment;

use crate::error::ClustererError;
use crate::types::{ProposalEnvelope, ProposedCluster};

pub const SYSTEM_PROMPT: &str = "You are an expert at analyzing audience feedback for content creators.
Group similar comments and provide actionable insights.
IMPORTANT: In sample_comment_indices, return the numeric indices [0], [1], etc. of the comments that belong to each cluster.";

/// Build the user prompt: one `[i] text` line per comment followed by the
/// expected JSON shape.
#[must_use]
pub fn build_prompt(comments: &[Comment], num_clusters: u32) -> String {
    let mut listing = String::new();
    for (i, comment) in comments.iter().enumerate() {
        if i > 0 {
            listing.push('\n');
        }
        // Newlines inside a comment would break the one-line-per-index layout.
        let text = comment.content.replace(['\r', '\n'], " ");
        let _ = write!(listing, "[{i}] {text}");
    }

    format!(
        r#"Analyze these comments and group into {num_clusters} themes:

{listing}

Respond in JSON format:
{{"clusters": [
  {{
    "theme": "Theme Name",
    "summary": "Brief summary of what viewers are asking about",
    "sample_comment_indices": [0, 1, 2],
    "content_ideas": [
      {{"title": "Video Title Idea", "description": "Description", "content_type": "video"}}
    ]
  }}
]}}

Make sure sample_comment_indices contains the [N] numbers from the comments above."#
    )
}

/// Remove a surrounding Markdown code fence and an optional `json` tag.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = rest.split("```").next().unwrap_or(rest);
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}

/// Parse the model's reply into proposed clusters.
///
/// # Errors
///
/// Returns [`ClustererError::Deserialize`] if the reply is not the expected
/// JSON object.
pub fn parse_proposals(raw: &str) -> Result<Vec<ProposedCluster>, ClustererError> {
    let cleaned = strip_code_fence(raw);
    let envelope: ProposalEnvelope =
        serde_json::from_str(cleaned).map_err(|e| ClustererError::Deserialize {
            context: "cluster proposals".to_string(),
            source: e,
        })?;
    Ok(envelope.clusters)
}
