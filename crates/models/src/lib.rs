pub mod errors;
pub mod db;
pub mod record;
pub mod state;
pub mod city;

pub use record::{CityRecord, Entity, EntityKind, StateRecord};
