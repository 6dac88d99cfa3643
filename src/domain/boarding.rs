//! Boarding state derivation.

use serde::Serialize;

use crate::models::{Member, Tour};

/// New boarded-id sequence after boarding or unboarding `member_id`.
///
/// Boarding appends only when absent; unboarding drops every occurrence.
pub fn with_boarding(boarded_ids: &[String], member_id: &str, boarding: bool) -> Vec<String> {
    let mut ids = boarded_ids.to_vec();
    if boarding {
        if !ids.iter().any(|id| id == member_id) {
            ids.push(member_id.to_string());
        }
    } else {
        ids.retain(|id| id != member_id);
    }
    ids
}

/// Boarded ids that still refer to a member of the tour, in their original order.
pub fn prune_boarded(boarded_ids: &[String], members: &[Member]) -> Vec<String> {
    boarded_ids
        .iter()
        .filter(|id| members.iter().any(|m| &m.id == *id))
        .cloned()
        .collect()
}

/// Last four digits of a phone, for compact display.
pub fn phone_tail(phone: &str) -> &str {
    let start = phone.len().saturating_sub(4);
    phone.get(start..).unwrap_or(phone)
}

/// Pending and boarded members of one tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardingSummary {
    pub bus_name: String,
    pub pending: Vec<Member>,
    pub boarded: Vec<Member>,
}

impl BoardingSummary {
    pub fn of(tour: &Tour) -> Self {
        let (boarded, pending): (Vec<Member>, Vec<Member>) = tour
            .members
            .iter()
            .cloned()
            .partition(|m| tour.is_boarded(&m.id));
        Self {
            bus_name: tour.bus_name.clone(),
            pending,
            boarded,
        }
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.boarded.len()
    }

    /// Everyone is aboard. An empty roster never counts as complete.
    pub fn all_aboard(&self) -> bool {
        self.pending.is_empty() && !self.boarded.is_empty()
    }
}
