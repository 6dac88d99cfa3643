//! Session identity and view state. Neither is persisted.

use serde::{Deserialize, Serialize};

use super::Leader;

/// Who is operating the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum Identity {
    Leader(Leader),
    Member,
    Admin,
}

impl Identity {
    pub fn role(&self) -> &'static str {
        match self {
            Identity::Leader(_) => "leader",
            Identity::Member => "member",
            Identity::Admin => "admin",
        }
    }

    /// Bus owned by this identity, if any.
    pub fn bus_id(&self) -> Option<&str> {
        match self {
            Identity::Leader(leader) => Some(&leader.bus_id),
            Identity::Member | Identity::Admin => None,
        }
    }

    /// Only a leader may manage its own bus.
    pub fn can_manage(&self, bus_id: &str) -> bool {
        self.bus_id() == Some(bus_id)
    }
}

/// Screen the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Landing,
    AdminLogin,
    Dashboard { bus_id: String },
    MemberScan { bus_id: String },
    AdminPanel,
}

impl View {
    /// Bus whose tour document this view needs.
    pub fn bus_id(&self) -> Option<&str> {
        match self {
            View::Dashboard { bus_id } | View::MemberScan { bus_id } => Some(bus_id),
            View::Landing | View::AdminLogin | View::AdminPanel => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(bus_id: &str) -> Leader {
        Leader {
            id: "L1".into(),
            name: "Amy".into(),
            username: "11301".into(),
            password: "1234".into(),
            group: "G-1128".into(),
            bus_id: bus_id.into(),
        }
    }

    #[test]
    fn test_leader_manages_only_own_bus() {
        let identity = Identity::Leader(leader("bus_A"));
        assert!(identity.can_manage("bus_A"));
        assert!(!identity.can_manage("bus_B"));
        assert!(!Identity::Member.can_manage("bus_A"));
        assert!(!Identity::Admin.can_manage("bus_A"));
    }

    #[test]
    fn test_view_bus_id() {
        assert_eq!(View::Landing.bus_id(), None);
        assert_eq!(View::AdminPanel.bus_id(), None);
        assert_eq!(
            View::MemberScan {
                bus_id: "bus_B".into()
            }
            .bus_id(),
            Some("bus_B")
        );
    }

    #[test]
    fn test_identity_serializes_role_tag() {
        let json = serde_json::to_value(Identity::Leader(leader("bus_A"))).unwrap();
        assert_eq!(json["role"], "leader");
        assert_eq!(json["busId"], "bus_A");
        assert_eq!(serde_json::to_value(Identity::Admin).unwrap()["role"], "admin");
    }
}
