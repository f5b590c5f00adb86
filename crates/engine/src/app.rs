//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    ports::{CharacterStore, ClientNotifier, ClockPort, CombatPort, SessionPort, WorldPort},
    settings::HeroSettings,
};
use crate::stores::{ControlContextStore, HeroGroupStore, PartyStore, SnapshotStore};
use crate::use_cases::heroes::{
    GroupRegistry, HeroDirectory, HeroUseCases, PartyLeadershipManager, PartyMembership,
    PositionVirtualizer, TurnControlCoordinator,
};

/// Collaborators supplied by the host server.
#[derive(Clone)]
pub struct AppPorts {
    pub characters: Arc<dyn CharacterStore>,
    pub sessions: Arc<dyn SessionPort>,
    pub combat: Arc<dyn CombatPort>,
    pub world: Arc<dyn WorldPort>,
    pub notifier: Arc<dyn ClientNotifier>,
    pub clock: Arc<dyn ClockPort>,
}

/// Runtime state owned by the hero subsystem.
pub struct Stores {
    pub groups: Arc<HeroGroupStore>,
    pub snapshots: Arc<SnapshotStore>,
    pub contexts: Arc<ControlContextStore>,
    pub parties: Arc<PartyStore>,
}

/// Main application state.
///
/// One instance per process; tests build as many isolated ones as they need.
pub struct App {
    pub settings: HeroSettings,
    pub stores: Stores,
    pub heroes: HeroUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(ports: AppPorts, settings: HeroSettings) -> Self {
        let settings = settings.normalized();

        let stores = Stores {
            groups: Arc::new(HeroGroupStore::new()),
            snapshots: Arc::new(SnapshotStore::new()),
            contexts: Arc::new(ControlContextStore::new()),
            parties: Arc::new(PartyStore::new()),
        };

        let directory = Arc::new(HeroDirectory::new(
            stores.groups.clone(),
            ports.characters.clone(),
        ));
        let positions = Arc::new(PositionVirtualizer::new(
            stores.snapshots.clone(),
            ports.world.clone(),
            ports.clock.clone(),
            settings.restore_to_free_cell,
        ));
        let party = Arc::new(PartyMembership::new(
            stores.parties.clone(),
            ports.characters.clone(),
            ports.sessions.clone(),
            ports.notifier.clone(),
        ));
        let turn_control = Arc::new(TurnControlCoordinator::new(
            directory.clone(),
            stores.contexts.clone(),
            ports.sessions.clone(),
            ports.combat.clone(),
            ports.notifier.clone(),
        ));
        let registry = Arc::new(GroupRegistry::new(
            stores.groups.clone(),
            directory.clone(),
            ports.characters.clone(),
            ports.world.clone(),
            positions.clone(),
            party.clone(),
            turn_control.clone(),
            settings.max_heroes_per_group,
        ));
        let leadership = Arc::new(PartyLeadershipManager::new(
            stores.groups.clone(),
            ports.characters.clone(),
            ports.sessions.clone(),
            ports.world.clone(),
            ports.notifier.clone(),
            positions.clone(),
            party.clone(),
            turn_control.clone(),
        ));

        tracing::debug!(
            max_heroes = settings.max_heroes_per_group,
            free_cell_fallback = settings.restore_to_free_cell,
            "Hero subsystem ready"
        );

        Self {
            settings,
            stores,
            heroes: HeroUseCases::new(
                directory,
                positions,
                party,
                turn_control,
                registry,
                leadership,
            ),
        }
    }
}
