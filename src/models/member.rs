//! Passenger model.

use serde::{Deserialize, Serialize};

/// A passenger on one tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Digits only; may be empty.
    #[serde(default)]
    pub phone: String,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: digits_only(phone),
        }
    }
}

/// Strip every non-digit character.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
