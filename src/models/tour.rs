//! Tour model: one bus's roster and boarding state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Member;

/// Roster and boarding state for one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub bus_name: String,
    #[serde(default)]
    pub members: Vec<Member>,
    /// Set of boarded member ids, stored as a sequence.
    #[serde(default)]
    pub boarded_ids: Vec<String>,
}

impl Tour {
    /// Empty tour named after its bus id.
    pub fn empty(bus_id: &str) -> Self {
        Self {
            bus_name: bus_id.to_string(),
            members: Vec::new(),
            boarded_ids: Vec::new(),
        }
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn is_boarded(&self, member_id: &str) -> bool {
        self.boarded_ids.iter().any(|id| id == member_id)
    }

    /// Shallow merge: every field present in the patch replaces the current value.
    pub fn apply_patch(&mut self, patch: &TourPatch) {
        if let Some(bus_name) = &patch.bus_name {
            self.bus_name = bus_name.clone();
        }
        if let Some(members) = &patch.members {
            self.members = members.clone();
        }
        if let Some(boarded_ids) = &patch.boarded_ids {
            self.boarded_ids = boarded_ids.clone();
        }
    }
}

/// Partial update of a tour document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boarded_ids: Option<Vec<String>>,
}

impl TourPatch {
    pub fn members(members: Vec<Member>) -> Self {
        Self {
            members: Some(members),
            ..Self::default()
        }
    }

    pub fn boarded_ids(boarded_ids: Vec<String>) -> Self {
        Self {
            boarded_ids: Some(boarded_ids),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bus_name.is_none() && self.members.is_none() && self.boarded_ids.is_none()
    }

    /// The patch as a field map, as sent to the remote store.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_patch_is_shallow() {
        let mut tour = Tour::empty("bus_A");
        tour.members.push(Member::new("m1", "Zhang", "0912345678"));
        tour.boarded_ids.push("m1".into());

        tour.apply_patch(&TourPatch::boarded_ids(vec![]));

        assert_eq!(tour.bus_name, "bus_A");
        assert_eq!(tour.members.len(), 1);
        assert!(tour.boarded_ids.is_empty());
    }

    #[test]
    fn test_patch_fields_only_contain_present_keys() {
        let fields = TourPatch::boarded_ids(vec!["m1".into()]).to_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["boardedIds"], serde_json::json!(["m1"]));
    }

    #[test]
    fn test_tour_document_shape() {
        let doc = serde_json::json!({
            "busName": "A",
            "members": [{ "id": "m1", "name": "Zhang", "phone": "0912345678" }],
        });
        let tour: Tour = serde_json::from_value(doc).unwrap();
        assert_eq!(tour.members[0].phone, "0912345678");
        assert!(tour.boarded_ids.is_empty());
    }
}
