use thiserror::Error;

/// Fatal problems with the Graph Data Object. Anything recoverable (unknown
/// edge targets, malformed method entries) is dropped with a debug log
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("artifact is missing the nodeInfo table")]
    MissingNodeInfo,
    #[error("artifact is missing the dependencies table")]
    MissingDependencies,
    #[error("artifact contains no nodes")]
    EmptyGraph,
    #[error("artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
