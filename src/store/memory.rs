//! In-process stores.
//!
//! `MemoryRemoteStore` implements the whole remote contract, including listener
//! fan-out and the array primitives, so several orchestrators can share one
//! instance the way several devices share a hosted database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{
    DocPath, LocalStore, RemoteSession, RemoteStore, SnapshotListener, StoreError,
    StoreErrorKind, Subscription,
};
use crate::config::RemoteConfig;

/// Local store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RemoteInner {
    docs: HashMap<String, Map<String, Value>>,
    listeners: HashMap<String, Vec<(u64, SnapshotListener)>>,
    next_listener_id: u64,
    sessions_issued: usize,
    reject_sign_in: Option<String>,
    fail_writes: Option<StoreError>,
}

/// Remote document store kept in memory.
#[derive(Clone, Default)]
pub struct MemoryRemoteStore {
    inner: Arc<Mutex<RemoteInner>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following sign-in fail with `message`.
    pub fn reject_sign_in(&self, message: impl Into<String>) {
        self.inner.lock().reject_sign_in = Some(message.into());
    }

    /// Make every following write fail with `error`, or clear it with `None`.
    pub fn fail_writes(&self, error: Option<StoreError>) {
        self.inner.lock().fail_writes = error;
    }

    /// Push a listener error to every subscriber of `path`.
    pub fn fail_listeners(&self, path: &DocPath, error: StoreError) {
        let listeners = self.listeners_of(&path.to_string());
        for listener in listeners {
            listener(Err(error.clone()));
        }
    }

    pub fn document(&self, path: &DocPath) -> Option<Value> {
        self.inner
            .lock()
            .docs
            .get(&path.to_string())
            .cloned()
            .map(Value::Object)
    }

    /// Overwrite a document directly, as an operator console would.
    pub fn put_document(&self, path: &DocPath, doc: Value) {
        let key = path.to_string();
        self.inner.lock().docs.insert(key.clone(), into_fields(doc));
        self.notify(&key);
    }

    pub fn listener_count(&self, path: &DocPath) -> usize {
        self.inner
            .lock()
            .listeners
            .get(&path.to_string())
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn sessions_issued(&self) -> usize {
        self.inner.lock().sessions_issued
    }

    fn listeners_of(&self, key: &str) -> Vec<SnapshotListener> {
        self.inner
            .lock()
            .listeners
            .get(key)
            .map(|listeners| listeners.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    // Listeners run after the lock is released so they may call back into the store.
    fn notify(&self, key: &str) {
        let snapshot = self.inner.lock().docs.get(key).cloned().map(Value::Object);
        for listener in self.listeners_of(key) {
            listener(Ok(snapshot.clone()));
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        match &self.inner.lock().fail_writes {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn modify_existing(
        &self,
        path: &DocPath,
        f: impl FnOnce(&mut Map<String, Value>),
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let key = path.to_string();
        {
            let mut inner = self.inner.lock();
            let Some(doc) = inner.docs.get_mut(&key) else {
                return Err(StoreError::with_kind(
                    format!("No document to update: {key}"),
                    StoreErrorKind::NotFound,
                ));
            };
            f(doc);
        }
        self.notify(&key);
        Ok(())
    }
}

fn into_fields(doc: Value) -> Map<String, Value> {
    match doc {
        Value::Object(fields) => fields,
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), other);
            fields
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn sign_in_anonymously(
        &self,
        config: &RemoteConfig,
    ) -> Result<RemoteSession, StoreError> {
        let mut inner = self.inner.lock();
        if let Some(message) = &inner.reject_sign_in {
            return Err(StoreError::with_kind(
                message.clone(),
                StoreErrorKind::PermissionDenied,
            ));
        }
        inner.sessions_issued += 1;
        tracing::debug!("Issued anonymous session for project {}", config.project_id());
        Ok(RemoteSession {
            uid: uuid::Uuid::new_v4().to_string(),
            signed_in_at: Utc::now(),
        })
    }

    fn subscribe(&self, path: &DocPath, listener: SnapshotListener) -> Subscription {
        let key = path.to_string();
        let (id, snapshot) = {
            let mut inner = self.inner.lock();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner
                .listeners
                .entry(key.clone())
                .or_default()
                .push((id, Arc::clone(&listener)));
            (id, inner.docs.get(&key).cloned().map(Value::Object))
        };

        listener(Ok(snapshot));

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            let mut inner = inner.lock();
            if let Some(listeners) = inner.listeners.get_mut(&key) {
                listeners.retain(|(listener_id, _)| *listener_id != id);
                if listeners.is_empty() {
                    inner.listeners.remove(&key);
                }
            }
        })
    }

    async fn update(&self, path: &DocPath, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.modify_existing(path, |doc| {
            for (field, value) in fields {
                doc.insert(field, value);
            }
        })
    }

    async fn set_if_absent(&self, path: &DocPath, doc: Value) -> Result<(), StoreError> {
        self.check_writable()?;
        let key = path.to_string();
        let inserted = {
            let mut inner = self.inner.lock();
            if inner.docs.contains_key(&key) {
                false
            } else {
                inner.docs.insert(key.clone(), into_fields(doc));
                true
            }
        };
        if inserted {
            self.notify(&key);
        }
        Ok(())
    }

    async fn array_add(&self, path: &DocPath, field: &str, value: Value) -> Result<(), StoreError> {
        self.modify_existing(path, |doc| match doc.get_mut(field) {
            Some(Value::Array(items)) => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            _ => {
                doc.insert(field.to_string(), Value::Array(vec![value]));
            }
        })
    }

    async fn array_remove(
        &self,
        path: &DocPath,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.modify_existing(path, |doc| match doc.get_mut(field) {
            Some(Value::Array(items)) => items.retain(|item| item != &value),
            _ => {
                doc.insert(field.to_string(), Value::Array(Vec::new()));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> RemoteConfig {
        RemoteConfig::parse(r#"{"apiKey":"k","projectId":"p"}"#).unwrap()
    }

    fn recorder() -> (SnapshotListener, Arc<Mutex<Vec<Option<Value>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: SnapshotListener = Arc::new(move |result| {
            if let Ok(snapshot) = result {
                sink.lock().push(snapshot);
            }
        });
        (listener, seen)
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_snapshot_then_changes() {
        let store = MemoryRemoteStore::new();
        let path = DocPath::tour("app", "bus_A");
        let (listener, seen) = recorder();

        let _sub = store.subscribe(&path, listener);
        store
            .set_if_absent(&path, json!({"busName": "A", "boardedIds": []}))
            .await
            .unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], None);
        assert_eq!(seen[1].as_ref().unwrap()["busName"], "A");
    }

    #[tokio::test]
    async fn test_set_if_absent_never_overwrites() {
        let store = MemoryRemoteStore::new();
        let path = DocPath::leaders("app");
        store.set_if_absent(&path, json!({"leaders": [1]})).await.unwrap();
        store.set_if_absent(&path, json!({"leaders": [2]})).await.unwrap();
        assert_eq!(store.document(&path).unwrap()["leaders"], json!([1]));
    }

    #[tokio::test]
    async fn test_array_primitives_behave_as_a_set() {
        let store = MemoryRemoteStore::new();
        let path = DocPath::tour("app", "bus_A");
        store.set_if_absent(&path, json!({"boardedIds": []})).await.unwrap();

        store.array_add(&path, "boardedIds", json!("m1")).await.unwrap();
        store.array_add(&path, "boardedIds", json!("m1")).await.unwrap();
        store.array_add(&path, "boardedIds", json!("m2")).await.unwrap();
        assert_eq!(
            store.document(&path).unwrap()["boardedIds"],
            json!(["m1", "m2"])
        );

        store.array_remove(&path, "boardedIds", json!("m1")).await.unwrap();
        assert_eq!(store.document(&path).unwrap()["boardedIds"], json!(["m2"]));
    }

    #[tokio::test]
    async fn test_update_requires_existing_document() {
        let store = MemoryRemoteStore::new();
        let err = store
            .update(&DocPath::tour("app", "nope"), Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_dropping_subscription_removes_listener() {
        let store = MemoryRemoteStore::new();
        let path = DocPath::tour("app", "bus_A");
        let (listener, _) = recorder();

        let sub = store.subscribe(&path, listener);
        assert_eq!(store.listener_count(&path), 1);
        sub.unsubscribe();
        assert_eq!(store.listener_count(&path), 0);
    }

    #[tokio::test]
    async fn test_sign_in_can_be_rejected() {
        let store = MemoryRemoteStore::new();
        assert!(store.sign_in_anonymously(&config()).await.is_ok());
        store.reject_sign_in("anonymous auth disabled");
        let err = store.sign_in_anonymously(&config()).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::PermissionDenied);
        assert_eq!(store.sessions_issued(), 1);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_document_untouched() {
        let store = MemoryRemoteStore::new();
        let path = DocPath::tour("app", "bus_A");
        store.set_if_absent(&path, json!({"boardedIds": []})).await.unwrap();

        store.fail_writes(Some(StoreError::new("offline")));
        assert!(store.array_add(&path, "boardedIds", json!("m1")).await.is_err());
        store.fail_writes(None);

        assert_eq!(store.document(&path).unwrap()["boardedIds"], json!([]));
    }
}
