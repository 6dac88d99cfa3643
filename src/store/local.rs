//! Local key-value storage and the two keys the roster keeps in it.

use async_trait::async_trait;

use super::StoreError;
use crate::config::RemoteConfig;
use crate::errors::RosterError;
use crate::models::RosterData;

/// Key holding the `{leaders, tours}` snapshot.
pub const SNAPSHOT_KEY: &str = "tour_roster.data";
/// Key holding the JSON remote-store configuration.
pub const REMOTE_CONFIG_KEY: &str = "tour_roster.remote_config";

/// Durable string storage. Last write wins; no transactions.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

fn storage_error(err: StoreError) -> RosterError {
    tracing::error!("Local storage error: {}", err);
    RosterError::Storage(format!("Local storage error: {}", err))
}

/// Load the persisted snapshot. `Ok(None)` when nothing has been saved yet or the
/// saved value cannot be parsed (logged).
pub async fn load_roster(store: &dyn LocalStore) -> Result<Option<RosterData>, RosterError> {
    let Some(raw) = store.get(SNAPSHOT_KEY).await.map_err(storage_error)? else {
        return Ok(None);
    };
    match RosterData::from_snapshot_json(&raw) {
        Ok(data) => Ok(Some(data)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable local snapshot: {}", e);
            Ok(None)
        }
    }
}

/// Write the entire snapshot.
pub async fn save_roster(store: &dyn LocalStore, data: &RosterData) -> Result<(), RosterError> {
    let json = data.to_snapshot_json()?;
    store.set(SNAPSHOT_KEY, &json).await.map_err(storage_error)
}

/// Raw remote config JSON, if any has been saved.
pub async fn load_remote_config_raw(store: &dyn LocalStore) -> Result<Option<String>, RosterError> {
    store.get(REMOTE_CONFIG_KEY).await.map_err(storage_error)
}

pub async fn save_remote_config(
    store: &dyn LocalStore,
    config: &RemoteConfig,
) -> Result<(), RosterError> {
    let json = config.to_json()?;
    store
        .set(REMOTE_CONFIG_KEY, &json)
        .await
        .map_err(storage_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLocalStore;

    #[tokio::test]
    async fn test_roster_round_trips_through_store() {
        let store = MemoryLocalStore::new();
        assert!(load_roster(&store).await.unwrap().is_none());

        let mut data = RosterData::seed();
        data.tour_mut("bus_A").boarded_ids.push("m1".into());
        save_roster(&store, &data).await.unwrap();

        assert_eq!(load_roster(&store).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_ignored() {
        let store = MemoryLocalStore::new();
        store.set(SNAPSHOT_KEY, "{not json").await.unwrap();
        assert!(load_roster(&store).await.unwrap().is_none());
    }
}
