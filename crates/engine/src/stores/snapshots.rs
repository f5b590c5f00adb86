//! One-shot position snapshots taken when a character becomes a ghost.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use warband_domain::{CharacterId, Position};

/// Last real-world position of a character, consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSnapshot {
    pub position: Position,
    pub captured_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct SnapshotStore {
    snapshots: DashMap<CharacterId, PositionSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot, replacing any older one.
    pub fn insert(&self, character: CharacterId, snapshot: PositionSnapshot) {
        self.snapshots.insert(character, snapshot);
    }

    pub fn get(&self, character: CharacterId) -> Option<PositionSnapshot> {
        self.snapshots.get(&character).map(|r| *r)
    }

    /// Remove and return the snapshot.
    pub fn take(&self, character: CharacterId) -> Option<PositionSnapshot> {
        self.snapshots.remove(&character).map(|(_, s)| s)
    }

    pub fn discard(&self, character: CharacterId) -> bool {
        self.snapshots.remove(&character).is_some()
    }
}
