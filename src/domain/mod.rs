//! Pure roster operations. Nothing here touches storage or the sync layer.

mod boarding;
mod checkin;
mod ids;
mod import;

pub use boarding::*;
pub use checkin::*;
pub use ids::*;
pub use import::*;
