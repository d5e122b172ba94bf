use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
