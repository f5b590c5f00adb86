//! Position virtualization: capture a character's real location before it
//! becomes a ghost, and put it back afterwards.

use std::sync::Arc;

use warband_domain::{CellId, Character, CharacterId, MapId, Position};

use crate::infrastructure::ports::{ClockPort, WorldPort};
use crate::stores::{PositionSnapshot, SnapshotStore};

pub struct PositionVirtualizer {
    snapshots: Arc<SnapshotStore>,
    world: Arc<dyn WorldPort>,
    clock: Arc<dyn ClockPort>,
    free_cell_fallback: bool,
}

impl PositionVirtualizer {
    pub fn new(
        snapshots: Arc<SnapshotStore>,
        world: Arc<dyn WorldPort>,
        clock: Arc<dyn ClockPort>,
        free_cell_fallback: bool,
    ) -> Self {
        Self {
            snapshots,
            world,
            clock,
            free_cell_fallback,
        }
    }

    /// Record the character's current position.
    ///
    /// Returns `None` (and drops any stale snapshot) when the map is unknown.
    pub fn capture(&self, character: &Character) -> Option<PositionSnapshot> {
        let Some(position) = character.position() else {
            if self.snapshots.discard(character.id) {
                tracing::debug!(character_id = %character.id, "Discarded stale position snapshot");
            }
            return None;
        };
        let snapshot = PositionSnapshot {
            position,
            captured_at: self.clock.now(),
        };
        self.snapshots.insert(character.id, snapshot);
        tracing::debug!(character_id = %character.id, position = %position, "Captured position");
        Some(snapshot)
    }

    /// Apply and consume the character's snapshot. Returns whether a
    /// restoration happened.
    pub fn restore(&self, character: &mut Character) -> bool {
        let Some(snapshot) = self.snapshots.take(character.id) else {
            return false;
        };
        let Position { map, cell, facing } = snapshot.position;
        if !self.world.map_exists(map) {
            tracing::debug!(character_id = %character.id, map = %map, "Snapshot map no longer exists");
            return false;
        }
        let cell = match cell {
            Some(cell) if self.world.cell_exists(map, cell) => Some(cell),
            _ => self.fallback_cell(map),
        };
        character.place(Position::new(map, cell, facing));
        tracing::debug!(character_id = %character.id, map = %map, cell = ?cell, "Restored position");
        true
    }

    /// Put the character back on its persisted save point.
    ///
    /// Silently does nothing (returns false) if the save map is gone.
    pub fn reload_from_save_point(&self, character: &mut Character) -> bool {
        let Some(save_point) = character.save_point else {
            return false;
        };
        let map = save_point.map;
        if !self.world.map_exists(map) {
            return false;
        }
        let cell = if self.world.is_cell_free(map, save_point.cell) {
            Some(save_point.cell)
        } else {
            self.fallback_cell(map).or_else(|| {
                self.world
                    .cell_exists(map, save_point.cell)
                    .then_some(save_point.cell)
            })
        };
        let Some(cell) = cell else {
            return false;
        };
        character.place(Position::new(map, Some(cell), character.facing));
        tracing::debug!(character_id = %character.id, map = %map, cell = %cell, "Reloaded save point");
        true
    }

    /// Restore from the snapshot, or from the save point when none is on file.
    pub fn restore_or_reload(&self, character: &mut Character) -> bool {
        self.restore(character) || self.reload_from_save_point(character)
    }

    pub fn discard(&self, character: CharacterId) {
        self.snapshots.discard(character);
    }

    pub fn has_snapshot(&self, character: CharacterId) -> bool {
        self.snapshots.get(character).is_some()
    }

    fn fallback_cell(&self, map: MapId) -> Option<CellId> {
        if !self.free_cell_fallback {
            return None;
        }
        self.world.free_cell(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::memory::InMemoryWorld;
    use crate::infrastructure::ports::{MockClockPort, MockWorldPort};
    use chrono::{TimeZone, Utc};
    use warband_domain::{AccountId, Facing, SavePoint};

    fn setup(fallback: bool) -> (PositionVirtualizer, Arc<InMemoryWorld>) {
        let world = Arc::new(InMemoryWorld::new());
        world.add_map(MapId::new(1), (100..110).map(CellId::new));
        let virtualizer = PositionVirtualizer::new(
            Arc::new(SnapshotStore::new()),
            world.clone(),
            Arc::new(SystemClock::new()),
            fallback,
        );
        (virtualizer, world)
    }

    fn placed(cell: u16) -> Character {
        Character::new(AccountId::new(), "Hero").with_position(Position::new(
            MapId::new(1),
            Some(CellId::new(cell)),
            Facing::North,
        ))
    }

    #[test]
    fn capture_then_restore_round_trips() {
        let (virtualizer, _) = setup(true);
        let mut character = placed(105);
        let original = character.position();

        assert!(virtualizer.capture(&character).is_some());
        character.place(Position::new(MapId::new(1), Some(CellId::new(101)), Facing::South));

        assert!(virtualizer.restore(&mut character));
        assert_eq!(character.position(), original);
        assert!(!virtualizer.has_snapshot(character.id));
    }

    #[test]
    fn snapshot_is_consumed_once() {
        let (virtualizer, _) = setup(true);
        let mut character = placed(105);
        virtualizer.capture(&character);

        assert!(virtualizer.restore(&mut character));
        assert!(!virtualizer.restore(&mut character));
    }

    #[test]
    fn capture_without_map_discards_stale_snapshot() {
        let (virtualizer, _) = setup(true);
        let mut character = placed(105);
        virtualizer.capture(&character);
        character.clear_position();

        assert!(virtualizer.capture(&character).is_none());
        assert!(!virtualizer.has_snapshot(character.id));
    }

    #[test]
    fn missing_cell_falls_back_to_free_cell() {
        let (virtualizer, world) = setup(true);
        let mut character = placed(105);
        virtualizer.capture(&character);
        world.remove_cell(MapId::new(1), CellId::new(105));

        assert!(virtualizer.restore(&mut character));
        assert_eq!(character.cell, Some(CellId::new(100)));
        assert_eq!(character.facing, Facing::North);
    }

    #[test]
    fn save_point_skips_occupied_cell() {
        let (virtualizer, world) = setup(true);
        world.attach(CharacterId::new(), MapId::new(1), CellId::new(100));
        let mut character = Character::new(AccountId::new(), "Hero")
            .with_save_point(SavePoint::new(MapId::new(1), CellId::new(100)));

        assert!(virtualizer.reload_from_save_point(&mut character));
        assert_eq!(character.cell, Some(CellId::new(101)));
    }

    #[test]
    fn save_point_on_unknown_map_does_nothing() {
        let (virtualizer, _) = setup(true);
        let mut character = Character::new(AccountId::new(), "Hero")
            .with_save_point(SavePoint::new(MapId::new(99), CellId::new(1)));

        assert!(!virtualizer.reload_from_save_point(&mut character));
        assert!(character.position().is_none());
    }

    #[test]
    fn occupied_save_point_is_kept_without_fallback() {
        let (virtualizer, world) = setup(false);
        world.attach(CharacterId::new(), MapId::new(1), CellId::new(100));
        let mut character = Character::new(AccountId::new(), "Hero")
            .with_save_point(SavePoint::new(MapId::new(1), CellId::new(100)));

        assert!(virtualizer.reload_from_save_point(&mut character));
        assert_eq!(character.cell, Some(CellId::new(100)));
    }

    #[test]
    fn snapshot_is_stamped_and_dropped_when_map_vanishes() {
        let stamp = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        let mut clock = MockClockPort::new();
        clock.expect_now().return_const(stamp);
        let mut world = MockWorldPort::new();
        world.expect_map_exists().times(1).return_const(false);
        world.expect_free_cell().never();

        let virtualizer = PositionVirtualizer::new(
            Arc::new(SnapshotStore::new()),
            Arc::new(world),
            Arc::new(clock),
            true,
        );
        let mut character = placed(105);

        let snapshot = virtualizer.capture(&character).unwrap();
        assert_eq!(snapshot.captured_at, stamp);
        assert!(!virtualizer.restore(&mut character));
        assert!(!virtualizer.has_snapshot(character.id));
    }
}
