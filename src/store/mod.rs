//! Store adapter contracts.
//!
//! The core only talks to storage through [`LocalStore`] (string key-value) and
//! [`RemoteStore`] (document database with push subscriptions). In-memory
//! implementations of both live here; the SQLite local store is in `db`.

mod local;
mod memory;
mod remote;

pub use local::*;
pub use memory::*;
pub use remote::*;

/// Classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Network or backend unavailable
    Transport,
    /// Rejected by the store's access rules
    PermissionDenied,
    /// Target document does not exist
    NotFound,
}

/// Adapter-level error (wraps arbitrary messages from the backing store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub message: String,
    pub kind: StoreErrorKind,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StoreErrorKind::Transport,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: StoreErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}
