//! Data models for the roster.
//!
//! Field names serialize in camelCase so local snapshots and remote documents stay
//! interchangeable with existing data.

mod identity;
mod leader;
mod member;
mod roster;
mod tour;

pub use identity::*;
pub use leader::*;
pub use member::*;
pub use roster::*;
pub use tour::*;
