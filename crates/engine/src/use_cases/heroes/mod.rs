//! Hero mode use cases.
//!
//! A master recruits up to three characters of its own account as heroes.
//! Heroes follow the master as invisible ghosts, and the master's session
//! steers each of them during its own combat turn.

mod directory;
mod error;
mod leadership;
mod party;
mod position;
mod registry;
mod turn_control;
mod types;

pub use directory::HeroDirectory;
pub use error::{ErrorCategory, HeroError};
pub use leadership::PartyLeadershipManager;
pub use party::PartyMembership;
pub use position::PositionVirtualizer;
pub use registry::GroupRegistry;
pub use turn_control::TurnControlCoordinator;
pub use types::{HeroOutcome, HeroRoster, RosterEntry};

use std::sync::Arc;

/// Container for hero use cases.
pub struct HeroUseCases {
    pub directory: Arc<HeroDirectory>,
    pub positions: Arc<PositionVirtualizer>,
    pub party: Arc<PartyMembership>,
    pub turn_control: Arc<TurnControlCoordinator>,
    pub registry: Arc<GroupRegistry>,
    pub leadership: Arc<PartyLeadershipManager>,
}

impl HeroUseCases {
    pub fn new(
        directory: Arc<HeroDirectory>,
        positions: Arc<PositionVirtualizer>,
        party: Arc<PartyMembership>,
        turn_control: Arc<TurnControlCoordinator>,
        registry: Arc<GroupRegistry>,
        leadership: Arc<PartyLeadershipManager>,
    ) -> Self {
        Self {
            directory,
            positions,
            party,
            turn_control,
            registry,
            leadership,
        }
    }
}
