//! Domain entities

mod character;
mod party;

pub use character::{Character, PendingAction};
pub use party::{Party, PartyDeparture};
