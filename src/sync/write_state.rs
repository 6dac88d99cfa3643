//! Per-document write state: `Clean → PendingWrite → (Confirmed | WriteFailed)`,
//! back to `Clean` once an authoritative snapshot lands.

use std::collections::BTreeMap;

/// Document whose writes are tracked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocKey {
    Leaders,
    Tour(String),
}

impl DocKey {
    pub fn tour(bus_id: &str) -> Self {
        DocKey::Tour(bus_id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Clean,
    PendingWrite,
    Confirmed,
    WriteFailed,
}

/// State of one document plus every state it has been in.
#[derive(Debug, Clone)]
pub struct WriteTracker {
    state: WriteState,
    history: Vec<WriteState>,
}

impl Default for WriteTracker {
    fn default() -> Self {
        Self {
            state: WriteState::Clean,
            history: vec![WriteState::Clean],
        }
    }
}

impl WriteTracker {
    pub fn state(&self) -> WriteState {
        self.state
    }

    pub fn history(&self) -> &[WriteState] {
        &self.history
    }

    pub fn begin(&mut self) {
        self.transition(WriteState::PendingWrite);
    }

    pub fn confirm(&mut self) {
        self.finish(WriteState::Confirmed);
    }

    pub fn fail(&mut self) {
        self.finish(WriteState::WriteFailed);
    }

    /// An inbound snapshot replaced local state. An outstanding write stays pending.
    pub fn observe_snapshot(&mut self) {
        match self.state {
            WriteState::Confirmed | WriteState::WriteFailed => self.transition(WriteState::Clean),
            WriteState::Clean | WriteState::PendingWrite => {}
        }
    }

    fn finish(&mut self, outcome: WriteState) {
        if self.state == WriteState::PendingWrite {
            self.transition(outcome);
        } else {
            tracing::debug!("Ignoring {:?} while {:?}", outcome, self.state);
        }
    }

    fn transition(&mut self, next: WriteState) {
        if self.state != next {
            self.state = next;
            self.history.push(next);
        }
    }
}

/// Trackers for every document written during this session.
#[derive(Debug, Default)]
pub struct WriteStates {
    trackers: BTreeMap<DocKey, WriteTracker>,
}

impl WriteStates {
    pub fn state(&self, key: &DocKey) -> WriteState {
        self.trackers
            .get(key)
            .map(WriteTracker::state)
            .unwrap_or(WriteState::Clean)
    }

    pub fn history(&self, key: &DocKey) -> Vec<WriteState> {
        self.trackers
            .get(key)
            .map(|t| t.history().to_vec())
            .unwrap_or_else(|| vec![WriteState::Clean])
    }

    pub fn tracker(&mut self, key: &DocKey) -> &mut WriteTracker {
        self.trackers.entry(key.clone()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WriteState::*;

    #[test]
    fn test_confirmed_write_then_snapshot() {
        let mut tracker = WriteTracker::default();
        tracker.begin();
        tracker.confirm();
        tracker.observe_snapshot();
        assert_eq!(tracker.history(), &[Clean, PendingWrite, Confirmed, Clean]);
    }

    #[test]
    fn test_failed_write_is_cleared_by_snapshot() {
        let mut tracker = WriteTracker::default();
        tracker.begin();
        tracker.fail();
        assert_eq!(tracker.state(), WriteFailed);
        tracker.observe_snapshot();
        assert_eq!(tracker.state(), Clean);
    }

    #[test]
    fn test_snapshot_does_not_settle_pending_write() {
        let mut tracker = WriteTracker::default();
        tracker.begin();
        tracker.observe_snapshot();
        assert_eq!(tracker.state(), PendingWrite);
    }

    #[test]
    fn test_outcome_without_pending_write_is_ignored() {
        let mut tracker = WriteTracker::default();
        tracker.confirm();
        tracker.fail();
        assert_eq!(tracker.history(), &[Clean]);
    }

    #[test]
    fn test_unknown_document_is_clean() {
        let states = WriteStates::default();
        assert_eq!(states.state(&DocKey::tour("bus_A")), Clean);
        assert_eq!(states.history(&DocKey::Leaders), vec![Clean]);
    }
}
