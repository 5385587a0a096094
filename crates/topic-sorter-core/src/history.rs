use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::PathBuf;

/// Most recent operations kept; older ones are evicted first.
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Move,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OperationHistory {
    records: VecDeque<OperationRecord>,
    capacity: usize,
}

impl Default for OperationHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl OperationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record_move(&mut self, source: PathBuf, destination: PathBuf) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(OperationRecord {
            kind: OperationKind::Move,
            source,
            destination,
            at: Utc::now(),
        });
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&OperationRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut history = OperationHistory::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            history.record_move(PathBuf::from(format!("/src/{i}")), PathBuf::from(format!("/dst/{i}")));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().source, PathBuf::from("/src/5"));
        assert_eq!(history.last().unwrap().destination, PathBuf::from("/dst/104"));
        assert!(history.iter().all(|r| r.kind == OperationKind::Move));
    }
}
