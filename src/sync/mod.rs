//! Dual-mode synchronization.
//!
//! The orchestrator owns the in-memory state tree and decides, per logical
//! collection, whether local storage or the remote document store is
//! authoritative.

mod mode;
mod orchestrator;
mod write_state;

pub use mode::*;
pub use orchestrator::*;
pub use write_state::*;
