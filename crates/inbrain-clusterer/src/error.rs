use thiserror::Error;

/// Errors returned by the clustering client and pipeline.
#[derive(Debug, Error)]
pub enum ClustererError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("clustering service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response could not be decoded into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid cluster request: {0}")]
    InvalidRequest(String),

    #[error("not enough comments: need {needed}, found {found}")]
    NotEnoughComments { needed: usize, found: usize },

    /// The service answered but nothing usable came back.
    #[error("clustering service produced no clusters")]
    NoClustersProduced,
}
