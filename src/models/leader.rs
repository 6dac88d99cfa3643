//! Leader account model.

use serde::{Deserialize, Serialize};

/// A staff account that manages exactly one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leader {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub group: String,
    pub bus_id: String,
}

/// Remote config document holding the global leader list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadersDoc {
    pub leaders: Vec<Leader>,
}
