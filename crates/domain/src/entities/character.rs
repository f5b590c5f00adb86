//! Character entity - a playable character owned by an account.

use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, CellId, CharacterId, CombatId, MapId, PartyId};
use crate::value_objects::{Facing, Position, SavePoint};

/// Something the character is in the middle of that forbids swapping control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    /// A queued game action (movement, interaction) not yet resolved
    GameAction,
    /// An open trade window with another character
    Exchange,
}

/// A character record as seen by the hero subsystem.
///
/// The world/session layer owns the record; hero mode only touches the
/// position fields, the `ghost` flag, `party`, `combat` and `ready`.
///
/// # Ghosts
///
/// A ghost is virtually positioned: its `map`/`cell` follow its master but
/// it is not attached to the physical map and nobody else can see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub account_id: AccountId,
    pub name: String,
    pub level: u16,

    /// True while the character is the incarnation of a live connection
    pub online: bool,
    pub ghost: bool,

    // Location tracking
    pub map: Option<MapId>,
    pub cell: Option<CellId>,
    pub facing: Facing,
    pub save_point: Option<SavePoint>,

    pub party: Option<PartyId>,
    pub combat: Option<CombatId>,
    pub pending_action: Option<PendingAction>,
    /// Ready for the next encounter
    pub ready: bool,
}

impl Character {
    pub fn new(account_id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            account_id,
            name: name.into(),
            level: 1,
            online: false,
            ghost: false,
            map: None,
            cell: None,
            facing: Facing::default(),
            save_point: None,
            party: None,
            combat: None,
            pending_action: None,
            ready: false,
        }
    }

    pub fn with_level(mut self, level: u16) -> Self {
        self.level = level;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.place(position);
        self
    }

    pub fn with_save_point(mut self, save_point: SavePoint) -> Self {
        self.save_point = Some(save_point);
        self
    }

    pub fn online(mut self) -> Self {
        self.online = true;
        self
    }

    /// Current position, or `None` when the map is unknown.
    pub fn position(&self) -> Option<Position> {
        self.map
            .map(|map| Position::new(map, self.cell, self.facing))
    }

    /// Both map and cell are known.
    pub fn has_resolved_position(&self) -> bool {
        self.map.is_some() && self.cell.is_some()
    }

    pub fn place(&mut self, position: Position) {
        self.map = Some(position.map);
        self.cell = position.cell;
        self.facing = position.facing;
    }

    pub fn clear_position(&mut self) {
        self.map = None;
        self.cell = None;
    }

    pub fn is_in_combat(&self) -> bool {
        self.combat.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.pending_action.is_some()
    }

    pub fn same_account(&self, other: &Character) -> bool {
        self.account_id == other.account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_character_is_offline_and_unplaced() {
        let character = Character::new(AccountId::new(), "Aelis");
        assert!(!character.online);
        assert!(!character.ghost);
        assert!(character.position().is_none());
    }

    #[test]
    fn position_keeps_unknown_cell() {
        let mut character = Character::new(AccountId::new(), "Aelis");
        character.place(Position::new(MapId::new(3), None, Facing::North));

        let position = character.position().unwrap();
        assert_eq!(position.map, MapId::new(3));
        assert_eq!(position.cell, None);
        assert!(!character.has_resolved_position());
    }

    #[test]
    fn clear_position_preserves_facing() {
        let mut character = Character::new(AccountId::new(), "Aelis").with_position(Position::new(
            MapId::new(3),
            Some(CellId::new(42)),
            Facing::West,
        ));
        character.clear_position();
        assert!(character.map.is_none());
        assert_eq!(character.facing, Facing::West);
    }
}
