use reqwest::StatusCode;

/// Failures of a dialogue exchange that are not turned into a reply.
///
/// Model-not-found and unreachable-service outcomes are never reported
/// through this type; they come back as ordinary assistant turns.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inference service returned status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Inference service returned a body that is not JSON: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
