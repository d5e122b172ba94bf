use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(String),
    #[error("connection error: {0}")]
    Connect(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("corrupt store file {path}: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(e: sea_orm::DbErr) -> Self {
        StorageError::Db(e.to_string())
    }
}
