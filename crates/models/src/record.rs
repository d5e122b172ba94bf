//! Caller-facing entity records.
//!
//! These are the shapes the storage facade hands out and the file engine
//! stores. The relational engine has its own sea-orm models (`state`, `city`)
//! and converts at the boundary.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ModelError;

/// Entity kinds tracked by the storage facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    State,
    City,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::State => "State",
            EntityKind::City => "City",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "State" => Ok(EntityKind::State),
            "City" => Ok(EntityKind::City),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

/// A state as callers see it.
///
/// `name` stays optional here: the relational engine enforces presence with a
/// NOT NULL column at save time, while the file engine renders a missing name
/// as the empty string. The asymmetry is intentional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StateRecord {
    /// Fresh record with a generated id and matching timestamps.
    pub fn new(name: Option<String>) -> Self {
        let ts = now();
        Self { id: Uuid::new_v4(), created_at: ts, updated_at: ts, name }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// A city belonging to one state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: Uuid,
    pub state_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CityRecord {
    pub fn new(state_id: Uuid, name: Option<String>) -> Self {
        let ts = now();
        Self { id: Uuid::new_v4(), state_id, created_at: ts, updated_at: ts, name }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Tagged union over the record kinds; the working set stores these keyed by
/// `"Kind.<id>"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    State(StateRecord),
    City(CityRecord),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::State(_) => EntityKind::State,
            Entity::City(_) => EntityKind::City,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Entity::State(s) => s.id,
            Entity::City(c) => c.id,
        }
    }

    /// Working-set key, `"State.<id>"` / `"City.<id>"`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.kind().as_str(), self.id())
    }

    pub fn updated_at(&self) -> DateTime<FixedOffset> {
        match self {
            Entity::State(s) => s.updated_at,
            Entity::City(c) => c.updated_at,
        }
    }

    /// Refresh `updated_at`; call before persisting a mutation.
    pub fn touch(&mut self) {
        let ts = now();
        match self {
            Entity::State(s) => s.updated_at = ts,
            Entity::City(c) => c.updated_at = ts,
        }
    }

    /// Plain mapping representation suitable for serialization.
    pub fn to_map(&self) -> Result<serde_json::Map<String, Value>, ModelError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(ModelError::Validation("entity did not serialize to a map".into())),
        }
    }

    /// Restore an entity from a mapping. `id` and the timestamps are kept when
    /// present and generated otherwise.
    pub fn from_map(mut map: serde_json::Map<String, Value>) -> Result<Self, ModelError> {
        let ts = now().to_rfc3339();
        map.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        map.entry("created_at").or_insert_with(|| Value::String(ts.clone()));
        map.entry("updated_at").or_insert_with(|| Value::String(ts));
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}
