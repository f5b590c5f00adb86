//! Collaborator ports: sessions, combat engine, world map and packet layer.

use warband_domain::{AccountId, CellId, CharacterId, CombatId, CombatantId, MapId};

use super::types::{ClientNotice, CombatTimeline, Combatant};

// =============================================================================
// Session
// =============================================================================

/// The network session of an account.
///
/// A session incarnates exactly one character at a time.
#[cfg_attr(test, mockall::automock)]
pub trait SessionPort: Send + Sync {
    fn is_connected(&self, account_id: AccountId) -> bool;
    fn current_incarnation(&self, account_id: AccountId) -> Option<CharacterId>;
    /// Redirect the session onto `character`. Returns false if the session
    /// is gone or refused the switch.
    fn switch_incarnation(&self, account_id: AccountId, character: CharacterId) -> bool;
    fn set_tracked_combatant(&self, account_id: AccountId, combatant: CombatantId);
    fn reset_tracked_combatant(&self, account_id: AccountId);
}

// =============================================================================
// Combat
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait CombatPort: Send + Sync {
    fn is_active(&self, combat: CombatId) -> bool;
    fn combatant_for_character(&self, combat: CombatId, character: CharacterId)
        -> Option<Combatant>;
    fn combatant(&self, combat: CombatId, id: CombatantId) -> Option<Combatant>;
    fn timeline(&self, combat: CombatId) -> Option<CombatTimeline>;
}

// =============================================================================
// World
// =============================================================================

/// Physical map layer: which maps and cells exist and who stands where.
#[cfg_attr(test, mockall::automock)]
pub trait WorldPort: Send + Sync {
    fn map_exists(&self, map: MapId) -> bool;
    fn cell_exists(&self, map: MapId, cell: CellId) -> bool;
    fn is_cell_free(&self, map: MapId, cell: CellId) -> bool;
    fn free_cell(&self, map: MapId) -> Option<CellId>;
    fn attach(&self, character: CharacterId, map: MapId, cell: CellId);
    /// Remove a character from whatever map it stands on. No-op if absent.
    fn detach(&self, character: CharacterId);
}

// =============================================================================
// Packets
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClientNotifier: Send + Sync {
    fn notify(&self, account_id: AccountId, notice: ClientNotice);
}
