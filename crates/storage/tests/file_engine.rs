use std::path::PathBuf;

use uuid::Uuid;

use models::{CityRecord, Entity, EntityKind, StateRecord};
use storage::{FileStorage, Storage};

fn temp_store() -> PathBuf {
    std::env::temp_dir().join(format!("statedir_store_{}.json", Uuid::new_v4()))
}

#[tokio::test]
async fn add_then_save_appears_in_all() -> Result<(), anyhow::Error> {
    let path = temp_store();
    let store = FileStorage::new(&path);

    let state = StateRecord::new(Some("Arizona".into()));
    let key = format!("State.{}", state.id);
    store.add(Entity::State(state)).await?;
    store.save().await?;

    let all = store.all(Some(EntityKind::State)).await?;
    assert!(all.contains_key(&key));
    assert_eq!(all.len(), 1);

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn delete_then_save_removes() -> Result<(), anyhow::Error> {
    let path = temp_store();
    let store = FileStorage::new(&path);

    let state = Entity::State(StateRecord::new(Some("Texas".into())));
    let key = state.key();
    store.add(state.clone()).await?;
    store.save().await?;

    store.delete(Some(&state)).await?;
    store.save().await?;

    let all = store.all(None).await?;
    assert!(!all.contains_key(&key));

    // Deleting nothing, or something untracked, is a no-op.
    store.delete(None).await?;
    store.delete(Some(&state)).await?;

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn save_persists_across_instances() -> Result<(), anyhow::Error> {
    let path = temp_store();
    let first = FileStorage::new(&path);

    let state = StateRecord::new(Some("California".into()));
    let state_id = state.id;
    let created_at = state.created_at;
    store_and_save(&first, Entity::State(state)).await?;

    let second = FileStorage::new(&path);
    second.reload().await?;
    let all = second.all(Some(EntityKind::State)).await?;
    let restored = all.get(&format!("State.{state_id}")).expect("restored state");
    match restored {
        Entity::State(s) => {
            assert_eq!(s.id, state_id);
            assert_eq!(s.created_at, created_at);
            assert_eq!(s.display_name(), "California");
        }
        other => panic!("unexpected entity: {other:?}"),
    }

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

async fn store_and_save(store: &FileStorage, entity: Entity) -> Result<(), anyhow::Error> {
    store.add(entity).await?;
    store.save().await?;
    Ok(())
}

#[tokio::test]
async fn reload_with_missing_file_leaves_set_empty() -> Result<(), anyhow::Error> {
    let store = FileStorage::new(temp_store());
    store.reload().await?;
    assert!(store.all(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn reload_twice_is_idempotent() -> Result<(), anyhow::Error> {
    let path = temp_store();
    let store = FileStorage::new(&path);
    store.add(Entity::State(StateRecord::new(Some("Nevada".into())))).await?;
    store.save().await?;

    store.reload().await?;
    let first = store.all(None).await?;
    store.reload().await?;
    let second = store.all(None).await?;
    assert_eq!(first, second);

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn reload_with_corrupt_file_fails_fast() -> Result<(), anyhow::Error> {
    let path = temp_store();
    tokio::fs::write(&path, b"{not json").await?;

    let store = FileStorage::new(&path);
    let err = store.reload().await.expect_err("corrupt file must fail reload");
    assert!(matches!(err, storage::StorageError::Corrupt { .. }));

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn deleting_a_state_leaves_its_cities() -> Result<(), anyhow::Error> {
    let path = temp_store();
    let store = FileStorage::new(&path);

    let state = Entity::State(StateRecord::new(Some("Arizona".into())));
    let state_id = state.id();
    store.add(state.clone()).await?;
    store.add(Entity::City(CityRecord::new(state_id, Some("Phoenix".into())))).await?;
    store.add(Entity::City(CityRecord::new(state_id, Some("Tucson".into())))).await?;
    store.save().await?;

    store.delete(Some(&state)).await?;
    store.save().await?;

    // No cascade in this engine: the cities stay tracked.
    assert!(store.all(Some(EntityKind::State)).await?.is_empty());
    assert_eq!(store.all(Some(EntityKind::City)).await?.len(), 2);

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn states_sort_ascending_by_name() -> Result<(), anyhow::Error> {
    let store = FileStorage::new(temp_store());
    for name in ["Texas", "California", "Arizona"] {
        store.add(Entity::State(StateRecord::new(Some(name.into())))).await?;
    }

    let all = store.all(Some(EntityKind::State)).await?;
    let mut names: Vec<String> = all
        .into_values()
        .map(|e| match e {
            Entity::State(s) => s.display_name().to_string(),
            other => panic!("unexpected entity: {other:?}"),
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["Arizona", "California", "Texas"]);
    Ok(())
}

#[tokio::test]
async fn factory_selects_file_engine_by_default() -> Result<(), anyhow::Error> {
    let mut cfg = configs::AppConfig::default();
    cfg.storage.file_path = temp_store().display().to_string();

    let store = storage::from_config(&cfg).await?;
    store.reload().await?;
    assert!(store.all(None).await?.is_empty());
    store.close().await;
    Ok(())
}
