//! Helper types for port operations.

use std::time::Duration;

use serde::Serialize;
use warband_domain::{CharacterId, CombatId, CombatantId, PartyId};

// =============================================================================
// Combat Types
// =============================================================================

/// A participant in a combat, as reported by the combat engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combatant {
    /// Fighter id, unique within the combat
    pub id: CombatantId,
    pub combat: CombatId,
    /// The character behind this fighter (None for monsters and summons)
    pub character: Option<CharacterId>,
    pub dead: bool,
}

impl Combatant {
    pub fn for_character(id: CombatantId, combat: CombatId, character: CharacterId) -> Self {
        Self {
            id,
            combat,
            character: Some(character),
            dead: false,
        }
    }

    pub fn monster(id: CombatantId, combat: CombatId) -> Self {
        Self {
            id,
            combat,
            character: None,
            dead: false,
        }
    }
}

/// Clock state of a running combat, used for the turn refresh packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatTimeline {
    pub elapsed: Duration,
    pub turn: u32,
    /// Fighter whose turn it currently is
    pub active: CombatantId,
}

// =============================================================================
// Client Notices
// =============================================================================

/// Fire-and-forget notifications pushed to a session.
///
/// The packet layer owns the byte format; this enum only says what to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientNotice {
    // Identity / panels of the incarnated character
    Stats { character: CharacterId },
    SpellList { character: CharacterId },
    Inventory { character: CharacterId },
    Identity { character: CharacterId },
    Vitals { character: CharacterId },

    // Combat focus
    CombatFocus { combat: CombatId, combatant: CombatantId },
    TurnStart { combatant: CombatantId },
    TurnClock { elapsed_ms: u64, turn: u32 },

    // Party
    PartyCreated { party: PartyId, chief: CharacterId },
    PartyMemberAdded { party: PartyId, member: CharacterId },
    PartyMemberRemoved { party: PartyId, member: CharacterId },
    PartyDissolved { party: PartyId },
    PartyLeaderChanged { party: PartyId, leader: CharacterId },
}

impl ClientNotice {
    pub fn turn_clock(timeline: &CombatTimeline) -> Self {
        Self::TurnClock {
            elapsed_ms: u64::try_from(timeline.elapsed.as_millis()).unwrap_or(u64::MAX),
            turn: timeline.turn,
        }
    }
}
