//! Remote document store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::StoreError;
use crate::config::RemoteConfig;

/// Result pushed to a subscriber: the document, or `None` if it does not exist.
pub type SnapshotResult = Result<Option<Value>, StoreError>;

/// Callback invoked for every snapshot or listener error on a document.
pub type SnapshotListener = Arc<dyn Fn(SnapshotResult) + Send + Sync>;

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: String,
    pub doc_id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            doc_id: doc_id.into(),
        }
    }

    /// `apps/<app_id>/config/main`, holding `{leaders}`.
    pub fn leaders(app_id: &str) -> Self {
        Self::new(format!("apps/{app_id}/config"), "main")
    }

    /// `apps/<app_id>/tours/<bus_id>`.
    pub fn tour(app_id: &str, bus_id: &str) -> Self {
        Self::new(format!("apps/{app_id}/tours"), bus_id)
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.doc_id)
    }
}

/// Anonymous session issued by the remote store's auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    pub uid: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Live listener registration. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Hosted document database.
///
/// Writes report only success or failure; confirmed state always arrives through
/// subscriptions.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn sign_in_anonymously(&self, config: &RemoteConfig)
        -> Result<RemoteSession, StoreError>;

    /// Register a listener. The current snapshot is delivered as soon as it is
    /// known, then again after every change.
    fn subscribe(&self, path: &DocPath, listener: SnapshotListener) -> Subscription;

    /// Merge top-level fields into an existing document.
    async fn update(&self, path: &DocPath, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Create the document unless it already exists.
    async fn set_if_absent(&self, path: &DocPath, doc: Value) -> Result<(), StoreError>;

    /// Add `value` to the array at `field` unless already present.
    async fn array_add(&self, path: &DocPath, field: &str, value: Value)
        -> Result<(), StoreError>;

    /// Remove every occurrence of `value` from the array at `field`.
    async fn array_remove(
        &self,
        path: &DocPath,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;
}
