//! Storage facade with interchangeable persistence engines.
//! - `db`: relational engine on sea-orm, fresh query per `all`, FK cascade.
//! - `file`: in-process working set persisted wholesale to one JSON file.
//! Engine selection happens once at startup via `from_config`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use models::{Entity, EntityKind};

pub mod errors;
pub mod db;
pub mod file;

pub use db::DbStorage;
pub use errors::StorageError;
pub use file::FileStorage;

/// Uniform persistence contract both engines implement. Callers hold an
/// `Arc<dyn Storage>` handed out by `from_config` and stay engine-agnostic.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every tracked entity keyed by `"Kind.<id>"`, optionally narrowed to one
    /// kind. The relational engine queries afresh on each call; the file
    /// engine snapshots its in-process map.
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>, StorageError>;

    /// Register a freshly constructed entity with the pending working set.
    /// Nothing is durable until `save`.
    async fn add(&self, entity: Entity) -> Result<(), StorageError>;

    /// Flush pending changes to the durable backing.
    async fn save(&self) -> Result<(), StorageError>;

    /// Remove the entity from the working set; durable removal lands on the
    /// next `save`. `None` and untracked entities are no-ops.
    async fn delete(&self, entity: Option<&Entity>) -> Result<(), StorageError>;

    /// (Re)establish the working set: idempotent schema creation for the
    /// relational engine, flat-file deserialization for the file engine.
    /// Safe to call repeatedly.
    async fn reload(&self) -> Result<(), StorageError>;

    /// Release the engine's request scope. No-op for the file engine.
    async fn close(&self);
}

/// One-time engine selection from configuration. The relational engine
/// connects immediately; a connection failure is fatal and propagated with no
/// retry. Anything else gets the file engine on the configured path.
pub async fn from_config(cfg: &configs::AppConfig) -> Result<Arc<dyn Storage>, StorageError> {
    match cfg.storage.engine {
        configs::EngineKind::Db => {
            let conn = models::db::connect(&cfg.database)
                .await
                .map_err(|e| StorageError::Connect(e.to_string()))?;
            Ok(Arc::new(DbStorage::new(conn)))
        }
        configs::EngineKind::File => Ok(Arc::new(FileStorage::new(&cfg.storage.file_path))),
    }
}
