//! Comment clustering for Inbox Brain.
//!
//! Sends a batch of unprocessed comments to an OpenAI-compatible chat
//! completion endpoint, parses the proposed themes, and assembles them into
//! [`inbrain_core::NewCluster`] records ready to persist. Storage is left to
//! the caller.

pub mod assemble;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod types;

mod retry;

pub use assemble::assemble_clusters;
pub use client::ClustererClient;
pub use error::ClustererError;
pub use pipeline::{run_clustering, MAX_COMMENTS_PER_RUN};
pub use types::{
    ClusterRequest, ClusteringOutcome, ProposedCluster, DEFAULT_MIN_CLUSTER_SIZE,
    DEFAULT_NUM_CLUSTERS,
};
