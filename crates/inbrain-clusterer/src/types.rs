use inbrain_core::NewCluster;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClustererError;

pub const DEFAULT_NUM_CLUSTERS: u32 = 10;
pub const DEFAULT_MIN_CLUSTER_SIZE: u32 = 5;
const NUM_CLUSTERS_RANGE: std::ops::RangeInclusive<u32> = 3..=20;
const MIN_CLUSTER_SIZE_FLOOR: u32 = 2;

/// Parameters for one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRequest {
    /// Number of themes to ask for.
    #[serde(default = "default_num_clusters")]
    pub num_clusters: u32,
    /// Minimum number of comments required before a run is attempted.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: u32,
}

fn default_num_clusters() -> u32 {
    DEFAULT_NUM_CLUSTERS
}

fn default_min_cluster_size() -> u32 {
    DEFAULT_MIN_CLUSTER_SIZE
}

impl Default for ClusterRequest {
    fn default() -> Self {
        Self {
            num_clusters: DEFAULT_NUM_CLUSTERS,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
        }
    }
}

impl ClusterRequest {
    /// # Errors
    ///
    /// Returns [`ClustererError::InvalidRequest`] if `num_clusters` is outside
    /// 3..=20 or `min_cluster_size` is below 2.
    pub fn validate(&self) -> Result<(), ClustererError> {
        if !NUM_CLUSTERS_RANGE.contains(&self.num_clusters) {
            return Err(ClustererError::InvalidRequest(format!(
                "num_clusters must be between {} and {}, got {}",
                NUM_CLUSTERS_RANGE.start(),
                NUM_CLUSTERS_RANGE.end(),
                self.num_clusters
            )));
        }
        if self.min_cluster_size < MIN_CLUSTER_SIZE_FLOOR {
            return Err(ClustererError::InvalidRequest(format!(
                "min_cluster_size must be at least {MIN_CLUSTER_SIZE_FLOOR}, got {}",
                self.min_cluster_size
            )));
        }
        Ok(())
    }
}

/// A theme as proposed by the model, before it is tied back to comments.
///
/// Element types are left loose: models regularly return stray strings in
/// index arrays or bare strings in idea lists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProposedCluster {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sample_comment_indices: Vec<serde_json::Value>,
    #[serde(default)]
    pub sample_comments: Vec<serde_json::Value>,
    #[serde(default)]
    pub content_ideas: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProposalEnvelope {
    #[serde(default)]
    pub clusters: Vec<ProposedCluster>,
}

/// Result of one run: clusters to insert and every comment that was sent to
/// the model (all of which become processed).
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOutcome {
    pub clusters: Vec<NewCluster>,
    pub processed_comment_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Chat completion wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}
