//! Flat-file engine.
//!
//! The whole working set lives in an in-process map keyed `"Kind.<id>"` and is
//! rewritten wholesale to one JSON file on every `save`. `reload` is the only
//! reader of that file; a missing file just means an empty working set, while
//! unparseable content is surfaced as an error rather than silently dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use models::{Entity, EntityKind};

use crate::errors::StorageError;
use crate::Storage;

pub struct FileStorage {
    objects: RwLock<BTreeMap<String, Entity>>,
    file_path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { objects: RwLock::new(BTreeMap::new()), file_path: path.into() }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(_, e)| kind.map_or(true, |k| e.kind() == k))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect())
    }

    async fn add(&self, entity: Entity) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.insert(entity.key(), entity);
        Ok(())
    }

    async fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }
        let objects = self.objects.read().await;
        let data =
            serde_json::to_vec(&*objects).map_err(|e| StorageError::Serialize(e.to_string()))?;
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        debug!(path = %self.file_path.display(), count = objects.len(), "flat store written");
        Ok(())
    }

    async fn delete(&self, entity: Option<&Entity>) -> Result<(), StorageError> {
        // No cascade: removing a state leaves its cities tracked.
        if let Some(entity) = entity {
            let mut objects = self.objects.write().await;
            objects.remove(&entity.key());
        }
        Ok(())
    }

    async fn reload(&self) -> Result<(), StorageError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            // No store file yet: the working set stays as it is (empty at
            // process start).
            Err(_) => return Ok(()),
        };
        let map: BTreeMap<String, Entity> =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                path: self.file_path.display().to_string(),
                reason: e.to_string(),
            })?;
        let mut objects = self.objects.write().await;
        *objects = map;
        debug!(path = %self.file_path.display(), count = objects.len(), "flat store loaded");
        Ok(())
    }

    async fn close(&self) {}
}
