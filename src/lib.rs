//! Tour Roster
//!
//! Roster check-in and boarding for tour-bus groups, synchronized either through
//! local storage or a hosted document store.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod models;
pub mod session;
pub mod share;
pub mod store;
pub mod sync;

pub use config::{Config, RemoteConfig};
pub use errors::{Notice, RosterError};
pub use session::Session;
pub use sync::{OrchestratorOptions, SyncOrchestrator};
