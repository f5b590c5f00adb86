//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Character records (world/account index)
//! - Network sessions and the packet layer
//! - The combat engine
//! - The physical map
//! - Clock (for testing)

mod external;
mod repos;
mod testing;
pub mod types;

pub use repos::CharacterStore;

pub use types::{ClientNotice, CombatTimeline, Combatant};

pub use external::{ClientNotifier, CombatPort, SessionPort, WorldPort};

pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockClientNotifier, MockCombatPort, MockSessionPort, MockWorldPort};

#[cfg(test)]
pub use repos::MockCharacterStore;

#[cfg(test)]
pub use testing::MockClockPort;
