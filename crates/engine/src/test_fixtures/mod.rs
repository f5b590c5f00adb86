//! Test fixtures: a small populated world wired to a fresh [`App`].
//!
//! Layout:
//! - account A: master "Aldric" (online, town map cell 105, facing west),
//!   offline "Brenna" (H1, second map cell 7, save point cell 3),
//!   offline "Corin" (H2, town map cell 110),
//!   offline "Dagny" (H3, no position, save point on the second map)
//! - account B: offline "Eskel"
//!
//! # Usage
//!
//! ```rust,ignore
//! let world = HeroWorld::new();
//! world.recruit(world.h1);
//! let combat = world.start_combat();
//! ```

use std::sync::Arc;

use warband_domain::{
    AccountId, CellId, Character, CharacterId, CombatId, CombatantId, Facing, MapId, Position,
    SavePoint,
};

use crate::app::{App, AppPorts};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory::{
    InMemoryCharacters, InMemoryCombat, InMemorySessions, InMemoryWorld, RecordingNotifier,
};
use crate::infrastructure::ports::{CharacterStore, CombatPort, Combatant, WorldPort};
use crate::infrastructure::settings::HeroSettings;
use crate::stores::ControlContextStore;
use crate::use_cases::heroes::HeroOutcome;

pub struct HeroWorld {
    pub app: App,
    pub characters: Arc<InMemoryCharacters>,
    pub sessions: Arc<InMemorySessions>,
    pub combat: Arc<InMemoryCombat>,
    pub world: Arc<InMemoryWorld>,
    pub notifier: Arc<RecordingNotifier>,

    pub account: AccountId,
    pub other_account: AccountId,
    pub map: MapId,
    pub second_map: MapId,

    pub master: CharacterId,
    pub h1: CharacterId,
    pub h2: CharacterId,
    pub h3: CharacterId,
    pub outsider: CharacterId,
}

impl HeroWorld {
    pub fn new() -> Self {
        Self::with_settings(HeroSettings::default())
    }

    pub fn with_settings(settings: HeroSettings) -> Self {
        let characters = Arc::new(InMemoryCharacters::new());
        let sessions = Arc::new(InMemorySessions::new());
        let combat = Arc::new(InMemoryCombat::new());
        let world = Arc::new(InMemoryWorld::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let map = MapId::new(1);
        let second_map = MapId::new(2);
        world.add_map(map, (100..120).map(CellId::new));
        world.add_map(second_map, (1..20).map(CellId::new));

        let account = AccountId::new();
        let other_account = AccountId::new();

        let master = characters.insert(
            Character::new(account, "Aldric")
                .with_level(50)
                .with_position(Position::new(map, Some(CellId::new(105)), Facing::West))
                .online(),
        );
        world.attach(master, map, CellId::new(105));
        sessions.connect(account, master);

        let h1 = characters.insert(
            Character::new(account, "Brenna")
                .with_level(40)
                .with_position(Position::new(second_map, Some(CellId::new(7)), Facing::North))
                .with_save_point(SavePoint::new(second_map, CellId::new(3))),
        );
        let h2 = characters.insert(
            Character::new(account, "Corin")
                .with_level(35)
                .with_position(Position::new(map, Some(CellId::new(110)), Facing::East)),
        );
        let h3 = characters.insert(
            Character::new(account, "Dagny")
                .with_level(20)
                .with_save_point(SavePoint::new(second_map, CellId::new(5))),
        );
        let outsider = characters.insert(Character::new(other_account, "Eskel"));

        let app = App::new(
            AppPorts {
                characters: characters.clone(),
                sessions: sessions.clone(),
                combat: combat.clone(),
                world: world.clone(),
                notifier: notifier.clone(),
                clock: Arc::new(SystemClock::new()),
            },
            settings,
        );

        Self {
            app,
            characters,
            sessions,
            combat,
            world,
            notifier,
            account,
            other_account,
            map,
            second_map,
            master,
            h1,
            h2,
            h3,
            outsider,
        }
    }

    /// Current record of a character.
    ///
    /// # Panics
    ///
    /// Panics if the character does not exist.
    pub fn character(&self, id: CharacterId) -> Character {
        self.characters
            .get(id)
            .unwrap_or_else(|| panic!("character {id} missing from fixture"))
    }

    pub fn update(&self, id: CharacterId, change: impl FnOnce(&mut Character)) {
        let mut character = self.character(id);
        change(&mut character);
        self.characters.save(&character);
    }

    /// Add an offline character to account A.
    pub fn add_character(&self, name: &str) -> CharacterId {
        self.characters.insert(Character::new(self.account, name))
    }

    /// Recruit `hero` into the master's group.
    ///
    /// # Panics
    ///
    /// Panics if the registry rejects the hero.
    pub fn recruit(&self, hero: CharacterId) -> HeroOutcome {
        self.app
            .heroes
            .registry
            .add_hero(self.master, hero)
            .unwrap_or_else(|e| panic!("recruiting {hero} failed: {e}"))
    }

    /// Start a fight with the master (combatant 1) followed by its heroes
    /// in activation order, and mark all of them as fighting.
    pub fn start_combat(&self) -> CombatId {
        let combat = CombatId::new();
        let members: Vec<CharacterId> = std::iter::once(self.master)
            .chain(self.app.heroes.registry.active_heroes(self.master))
            .collect();
        let combatants = members
            .iter()
            .zip(1..)
            .map(|(id, n)| Combatant::for_character(CombatantId::new(n), combat, *id))
            .collect();
        for id in &members {
            self.update(*id, |c| c.combat = Some(combat));
        }
        self.combat.start(combat, combatants);
        combat
    }

    /// # Panics
    ///
    /// Panics if `character` is not fighting in `combat`.
    pub fn combatant(&self, combat: CombatId, character: CharacterId) -> Combatant {
        self.combat
            .combatant_for_character(combat, character)
            .unwrap_or_else(|| panic!("{character} is not in combat {combat}"))
    }

    pub fn contexts(&self) -> &ControlContextStore {
        &self.app.stores.contexts
    }
}

impl Default for HeroWorld {
    fn default() -> Self {
        Self::new()
    }
}
