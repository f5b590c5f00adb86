//! In-memory adapters for every port.
//!
//! Used by the demo binary and by tests. Each adapter is safe to share
//! across threads.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use warband_domain::{
    AccountId, CellId, Character, CharacterId, CombatId, CombatantId, MapId,
};

use crate::infrastructure::ports::{
    CharacterStore, ClientNotice, ClientNotifier, CombatPort, CombatTimeline, Combatant,
    SessionPort, WorldPort,
};

// =============================================================================
// Characters
// =============================================================================

#[derive(Default)]
pub struct InMemoryCharacters {
    characters: DashMap<CharacterId, Character>,
    active: DashMap<AccountId, CharacterId>,
}

impl InMemoryCharacters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn active_character(&self, account_id: AccountId) -> Option<CharacterId> {
        self.active.get(&account_id).map(|r| *r)
    }
}

impl CharacterStore for InMemoryCharacters {
    fn get(&self, id: CharacterId) -> Option<Character> {
        self.characters.get(&id).map(|r| r.clone())
    }

    fn save(&self, character: &Character) {
        self.characters.insert(character.id, character.clone());
    }

    fn account_characters(&self, account_id: AccountId) -> Vec<Character> {
        let mut characters: Vec<Character> = self
            .characters
            .iter()
            .filter(|r| r.account_id == account_id)
            .map(|r| r.clone())
            .collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name));
        characters
    }

    fn set_active_character(&self, account_id: AccountId, id: CharacterId) {
        self.active.insert(account_id, id);
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct SessionState {
    connected: bool,
    incarnation: CharacterId,
    tracked: Option<CombatantId>,
}

#[derive(Default)]
pub struct InMemorySessions {
    sessions: DashMap<AccountId, SessionState>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `account_id` incarnating `character`.
    pub fn connect(&self, account_id: AccountId, character: CharacterId) {
        self.sessions.insert(
            account_id,
            SessionState {
                connected: true,
                incarnation: character,
                tracked: None,
            },
        );
    }

    pub fn disconnect(&self, account_id: AccountId) {
        if let Some(mut session) = self.sessions.get_mut(&account_id) {
            session.connected = false;
        }
    }

    pub fn tracked_combatant(&self, account_id: AccountId) -> Option<CombatantId> {
        self.sessions.get(&account_id).and_then(|s| s.tracked)
    }
}

impl SessionPort for InMemorySessions {
    fn is_connected(&self, account_id: AccountId) -> bool {
        self.sessions
            .get(&account_id)
            .map(|s| s.connected)
            .unwrap_or(false)
    }

    fn current_incarnation(&self, account_id: AccountId) -> Option<CharacterId> {
        self.sessions
            .get(&account_id)
            .filter(|s| s.connected)
            .map(|s| s.incarnation)
    }

    fn switch_incarnation(&self, account_id: AccountId, character: CharacterId) -> bool {
        match self.sessions.get_mut(&account_id) {
            Some(mut session) if session.connected => {
                session.incarnation = character;
                true
            }
            _ => false,
        }
    }

    fn set_tracked_combatant(&self, account_id: AccountId, combatant: CombatantId) {
        if let Some(mut session) = self.sessions.get_mut(&account_id) {
            session.tracked = Some(combatant);
        }
    }

    fn reset_tracked_combatant(&self, account_id: AccountId) {
        if let Some(mut session) = self.sessions.get_mut(&account_id) {
            session.tracked = None;
        }
    }
}

// =============================================================================
// Combat
// =============================================================================

#[derive(Debug, Clone)]
struct CombatState {
    active: bool,
    combatants: Vec<Combatant>,
    timeline: Option<CombatTimeline>,
}

#[derive(Default)]
pub struct InMemoryCombat {
    combats: DashMap<CombatId, CombatState>,
}

impl InMemoryCombat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, combat: CombatId, combatants: Vec<Combatant>) {
        let timeline = combatants.first().map(|c| CombatTimeline {
            elapsed: std::time::Duration::ZERO,
            turn: 1,
            active: c.id,
        });
        self.combats.insert(
            combat,
            CombatState {
                active: true,
                combatants,
                timeline,
            },
        );
    }

    pub fn set_timeline(&self, combat: CombatId, timeline: CombatTimeline) {
        if let Some(mut state) = self.combats.get_mut(&combat) {
            state.timeline = Some(timeline);
        }
    }

    pub fn kill(&self, combat: CombatId, id: CombatantId) {
        if let Some(mut state) = self.combats.get_mut(&combat) {
            if let Some(c) = state.combatants.iter_mut().find(|c| c.id == id) {
                c.dead = true;
            }
        }
    }

    pub fn remove_combatant(&self, combat: CombatId, id: CombatantId) {
        if let Some(mut state) = self.combats.get_mut(&combat) {
            state.combatants.retain(|c| c.id != id);
        }
    }

    pub fn end(&self, combat: CombatId) {
        if let Some(mut state) = self.combats.get_mut(&combat) {
            state.active = false;
            state.timeline = None;
        }
    }
}

impl CombatPort for InMemoryCombat {
    fn is_active(&self, combat: CombatId) -> bool {
        self.combats.get(&combat).map(|s| s.active).unwrap_or(false)
    }

    fn combatant_for_character(
        &self,
        combat: CombatId,
        character: CharacterId,
    ) -> Option<Combatant> {
        self.combats.get(&combat).and_then(|s| {
            s.combatants
                .iter()
                .find(|c| c.character == Some(character))
                .copied()
        })
    }

    fn combatant(&self, combat: CombatId, id: CombatantId) -> Option<Combatant> {
        self.combats
            .get(&combat)
            .and_then(|s| s.combatants.iter().find(|c| c.id == id).copied())
    }

    fn timeline(&self, combat: CombatId) -> Option<CombatTimeline> {
        self.combats
            .get(&combat)
            .filter(|s| s.active)
            .and_then(|s| s.timeline)
    }
}

// =============================================================================
// World
// =============================================================================

#[derive(Debug, Default)]
struct MapState {
    cells: BTreeSet<CellId>,
    occupants: HashMap<CellId, HashSet<CharacterId>>,
}

#[derive(Default)]
pub struct InMemoryWorld {
    maps: DashMap<MapId, MapState>,
    placements: DashMap<CharacterId, (MapId, CellId)>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map with the given walkable cells.
    pub fn add_map(&self, map: MapId, cells: impl IntoIterator<Item = CellId>) {
        self.maps.insert(
            map,
            MapState {
                cells: cells.into_iter().collect(),
                occupants: HashMap::new(),
            },
        );
    }

    pub fn remove_cell(&self, map: MapId, cell: CellId) {
        if let Some(mut state) = self.maps.get_mut(&map) {
            state.cells.remove(&cell);
        }
    }

    pub fn placement(&self, character: CharacterId) -> Option<(MapId, CellId)> {
        self.placements.get(&character).map(|r| *r)
    }
}

impl WorldPort for InMemoryWorld {
    fn map_exists(&self, map: MapId) -> bool {
        self.maps.contains_key(&map)
    }

    fn cell_exists(&self, map: MapId, cell: CellId) -> bool {
        self.maps
            .get(&map)
            .map(|s| s.cells.contains(&cell))
            .unwrap_or(false)
    }

    fn is_cell_free(&self, map: MapId, cell: CellId) -> bool {
        self.maps
            .get(&map)
            .map(|s| {
                s.cells.contains(&cell)
                    && s.occupants.get(&cell).map(HashSet::is_empty).unwrap_or(true)
            })
            .unwrap_or(false)
    }

    fn free_cell(&self, map: MapId) -> Option<CellId> {
        let state = self.maps.get(&map)?;
        state
            .cells
            .iter()
            .find(|cell| {
                state
                    .occupants
                    .get(cell)
                    .map(HashSet::is_empty)
                    .unwrap_or(true)
            })
            .copied()
    }

    fn attach(&self, character: CharacterId, map: MapId, cell: CellId) {
        self.detach(character);
        if let Some(mut state) = self.maps.get_mut(&map) {
            state.occupants.entry(cell).or_default().insert(character);
            self.placements.insert(character, (map, cell));
        }
    }

    fn detach(&self, character: CharacterId) {
        let Some((_, (map, cell))) = self.placements.remove(&character) else {
            return;
        };
        if let Some(mut state) = self.maps.get_mut(&map) {
            if let Some(occupants) = state.occupants.get_mut(&cell) {
                occupants.remove(&character);
            }
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Records every notice and echoes it to the trace log.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(AccountId, ClientNotice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_to(&self, account_id: AccountId) -> Vec<ClientNotice> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(account, _)| *account == account_id)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ClientNotifier for RecordingNotifier {
    fn notify(&self, account_id: AccountId, notice: ClientNotice) {
        tracing::trace!(account_id = %account_id, notice = ?notice, "Client notice");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((account_id, notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_tracks_occupancy() {
        let world = InMemoryWorld::new();
        let map = MapId::new(1);
        world.add_map(map, [CellId::new(1), CellId::new(2)]);
        let a = CharacterId::new();

        assert_eq!(world.free_cell(map), Some(CellId::new(1)));
        world.attach(a, map, CellId::new(1));
        assert!(!world.is_cell_free(map, CellId::new(1)));
        assert_eq!(world.free_cell(map), Some(CellId::new(2)));

        world.detach(a);
        assert!(world.is_cell_free(map, CellId::new(1)));
        assert_eq!(world.placement(a), None);
    }

    #[test]
    fn disconnected_session_refuses_switch() {
        let sessions = InMemorySessions::new();
        let account = AccountId::new();
        let (m, h) = (CharacterId::new(), CharacterId::new());
        sessions.connect(account, m);

        assert!(sessions.switch_incarnation(account, h));
        assert_eq!(sessions.current_incarnation(account), Some(h));

        sessions.disconnect(account);
        assert!(!sessions.switch_incarnation(account, m));
        assert_eq!(sessions.current_incarnation(account), None);
    }
}
