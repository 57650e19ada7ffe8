//! Error types for payload parsing.

use thiserror::Error;

/// Errors raised while turning raw response bytes into a payload.
///
/// Ingestion itself never fails; see [`IngestReport`](crate::IngestReport).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,
}
