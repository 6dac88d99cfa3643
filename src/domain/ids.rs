//! Member id generation.

use chrono::Utc;

/// Issues `m_<millis>_<index>` ids.
///
/// Each batch gets a stamp strictly greater than the previous one, so ids stay
/// unique even when two batches land in the same millisecond.
#[derive(Debug, Default)]
pub struct MemberIdGenerator {
    last_stamp: i64,
}

impl MemberIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a stamp for one batch of ids.
    pub fn next_batch(&mut self) -> IdBatch {
        let now = Utc::now().timestamp_millis();
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        IdBatch { stamp }
    }
}

/// Ids sharing one stamp, told apart by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBatch {
    stamp: i64,
}

impl IdBatch {
    pub fn id(&self, index: usize) -> String {
        format!("m_{}_{}", self.stamp, index)
    }
}
