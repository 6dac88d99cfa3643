//! The full state tree: global leaders plus one tour per bus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Leader, Member, Tour};

/// Snapshot persisted to local storage as `{leaders, tours}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterData {
    pub leaders: Vec<Leader>,
    pub tours: BTreeMap<String, Tour>,
}

/// Snapshot as read back from storage; either half may be missing.
#[derive(Debug, Default, Deserialize)]
struct StoredRoster {
    #[serde(default)]
    leaders: Option<Vec<Leader>>,
    #[serde(default)]
    tours: Option<BTreeMap<String, Tour>>,
}

impl RosterData {
    /// Data used on first run.
    pub fn seed() -> Self {
        let leader = |id: &str, name: &str, username: &str, bus_id: &str| Leader {
            id: id.to_string(),
            name: name.to_string(),
            username: username.to_string(),
            password: "1234".to_string(),
            group: "G-1128".to_string(),
            bus_id: bus_id.to_string(),
        };
        let tour = |bus_name: &str, members: Vec<Member>| Tour {
            bus_name: bus_name.to_string(),
            members,
            boarded_ids: Vec::new(),
        };

        let mut tours = BTreeMap::new();
        tours.insert(
            "bus_A".to_string(),
            tour(
                "A車 (王小明)",
                vec![Member::new("m1", "張三", "0912345678")],
            ),
        );
        tours.insert("bus_B".to_string(), tour("B車 (陳大華)", Vec::new()));
        tours.insert("bus_C".to_string(), tour("C車 (林美麗)", Vec::new()));

        Self {
            leaders: vec![
                leader("L1", "王小明", "11301", "bus_A"),
                leader("L2", "陳大華", "11302", "bus_B"),
                leader("L3", "林美麗", "11303", "bus_C"),
            ],
            tours,
        }
    }

    /// Parse a stored snapshot, taking missing halves from the seed.
    pub fn from_snapshot_json(json: &str) -> Result<Self, serde_json::Error> {
        let stored: StoredRoster = serde_json::from_str(json)?;
        let seed = Self::seed();
        Ok(Self {
            leaders: stored.leaders.unwrap_or(seed.leaders),
            tours: stored.tours.unwrap_or(seed.tours),
        })
    }

    pub fn to_snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn tour(&self, bus_id: &str) -> Option<&Tour> {
        self.tours.get(bus_id)
    }

    /// Tour for a bus, created empty if this bus has never been seen.
    pub fn tour_mut(&mut self, bus_id: &str) -> &mut Tour {
        self.tours
            .entry(bus_id.to_string())
            .or_insert_with(|| Tour::empty(bus_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_has_one_tour_per_leader() {
        let seed = RosterData::seed();
        assert_eq!(seed.leaders.len(), 3);
        for leader in &seed.leaders {
            assert!(seed.tours.contains_key(&leader.bus_id));
        }
        assert_eq!(seed.tours["bus_A"].members[0].id, "m1");
    }

    #[test]
    fn test_snapshot_missing_tours_falls_back_to_seed() {
        let data = RosterData::from_snapshot_json(r#"{"leaders": []}"#).unwrap();
        assert!(data.leaders.is_empty());
        assert_eq!(data.tours.len(), 3);
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let json = RosterData::seed().to_snapshot_json().unwrap();
        assert!(json.contains("\"busId\":\"bus_A\""));
        assert!(json.contains("\"boardedIds\":[]"));
    }
}
