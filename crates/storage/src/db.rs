//! Relational engine on sea-orm.
//!
//! `all` queries the database afresh on every call and overlays the pending
//! request scope, so additions are visible before commit and pending deletes
//! are not. `save` flushes the scope in one transaction; the `cities` FK
//! cascade removes children when their state row is deleted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    DatabaseConnection, EntityTrait, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use migration::MigratorTrait;
use models::{city, state, Entity, EntityKind};

use crate::errors::StorageError;
use crate::Storage;

#[derive(Default)]
struct Pending {
    added: Vec<Entity>,
    deleted: Vec<(EntityKind, Uuid)>,
}

pub struct DbStorage {
    db: DatabaseConnection,
    pending: Mutex<Pending>,
}

impl DbStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, pending: Mutex::new(Pending::default()) }
    }
}

fn state_active_model(s: &models::StateRecord) -> state::ActiveModel {
    state::ActiveModel {
        id: Set(s.id),
        // A missing name stays unset so the NOT NULL column rejects it at
        // save time.
        name: s.name.clone().map(Set).unwrap_or(NotSet),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
    }
}

fn city_active_model(c: &models::CityRecord) -> city::ActiveModel {
    city::ActiveModel {
        id: Set(c.id),
        state_id: Set(c.state_id),
        name: c.name.clone().map(Set).unwrap_or(NotSet),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    }
}

#[async_trait]
impl Storage for DbStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<String, Entity>, StorageError> {
        let mut map = BTreeMap::new();
        if kind.map_or(true, |k| k == EntityKind::State) {
            for m in state::Entity::find().all(&self.db).await? {
                let e = Entity::State(m.into());
                map.insert(e.key(), e);
            }
        }
        if kind.map_or(true, |k| k == EntityKind::City) {
            for m in city::Entity::find().all(&self.db).await? {
                let e = Entity::City(m.into());
                map.insert(e.key(), e);
            }
        }
        // Overlay the request scope: pending adds show up before commit,
        // pending deletes disappear immediately.
        let pending = self.pending.lock().await;
        for e in &pending.added {
            if kind.map_or(true, |k| e.kind() == k) {
                map.insert(e.key(), e.clone());
            }
        }
        for (k, id) in &pending.deleted {
            map.remove(&format!("{}.{}", k.as_str(), id));
        }
        Ok(map)
    }

    async fn add(&self, entity: Entity) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().await;
        pending.added.push(entity);
        Ok(())
    }

    async fn save(&self) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().await;
        if pending.added.is_empty() && pending.deleted.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin().await?;
        for entity in &pending.added {
            match entity {
                Entity::State(s) => {
                    state_active_model(s).insert(&txn).await?;
                }
                Entity::City(c) => {
                    city_active_model(c).insert(&txn).await?;
                }
            }
        }
        for (kind, id) in &pending.deleted {
            match kind {
                EntityKind::State => {
                    state::Entity::delete_by_id(*id).exec(&txn).await?;
                }
                EntityKind::City => {
                    city::Entity::delete_by_id(*id).exec(&txn).await?;
                }
            }
        }
        txn.commit().await?;
        debug!(
            added = pending.added.len(),
            deleted = pending.deleted.len(),
            "request scope committed"
        );
        pending.added.clear();
        pending.deleted.clear();
        Ok(())
    }

    async fn delete(&self, entity: Option<&Entity>) -> Result<(), StorageError> {
        let Some(entity) = entity else { return Ok(()) };
        let mut pending = self.pending.lock().await;
        let key = entity.key();
        // An entity added in this scope and deleted again never reaches the
        // database.
        if let Some(pos) = pending.added.iter().position(|e| e.key() == key) {
            pending.added.remove(pos);
            return Ok(());
        }
        pending.deleted.push((entity.kind(), entity.id()));
        Ok(())
    }

    async fn reload(&self) -> Result<(), StorageError> {
        // Schema creation is idempotent; `up` applies only missing migrations.
        migration::Migrator::up(&self.db, None).await?;
        Ok(())
    }

    async fn close(&self) {
        // Drop the request scope; uncommitted work does not survive it.
        let mut pending = self.pending.lock().await;
        pending.added.clear();
        pending.deleted.clear();
    }
}
