//! Warband domain: characters, parties and positions shared by the engine.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{Character, Party, PartyDeparture, PendingAction};
pub use error::DomainError;
pub use ids::{AccountId, CellId, CharacterId, CombatId, CombatantId, MapId, PartyId};
pub use value_objects::{Facing, Position, SavePoint};
