use odis_primitives::Eip712Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid domain configuration: {0}")]
    InvalidDomainConfiguration(&'static str),

    #[error("unrecognized domain kind: name {name:?}, version {version:?}")]
    UnrecognizedDomainKind { name: String, version: String },

    #[error("typed data encoding failed: {0}")]
    Eip712(#[from] Eip712Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("insufficient signer responses: {responses} usable, threshold {threshold}")]
    InsufficientSignerResponses { responses: usize, threshold: usize },
}
