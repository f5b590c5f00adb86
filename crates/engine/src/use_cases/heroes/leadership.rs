//! Party leadership: promoting a hero to be the played character, and
//! tidying a group once its fight is over.

use std::sync::Arc;

use warband_domain::{Character, CharacterId};

use crate::infrastructure::ports::{
    CharacterStore, ClientNotice, ClientNotifier, SessionPort, WorldPort,
};
use crate::stores::HeroGroupStore;

use super::error::HeroError;
use super::party::PartyMembership;
use super::position::PositionVirtualizer;
use super::turn_control::TurnControlCoordinator;
use super::types::HeroOutcome;

pub struct PartyLeadershipManager {
    groups: Arc<HeroGroupStore>,
    characters: Arc<dyn CharacterStore>,
    sessions: Arc<dyn SessionPort>,
    world: Arc<dyn WorldPort>,
    notifier: Arc<dyn ClientNotifier>,
    positions: Arc<PositionVirtualizer>,
    party: Arc<PartyMembership>,
    turn_control: Arc<TurnControlCoordinator>,
}

impl PartyLeadershipManager {
    pub fn new(
        groups: Arc<HeroGroupStore>,
        characters: Arc<dyn CharacterStore>,
        sessions: Arc<dyn SessionPort>,
        world: Arc<dyn WorldPort>,
        notifier: Arc<dyn ClientNotifier>,
        positions: Arc<PositionVirtualizer>,
        party: Arc<PartyMembership>,
        turn_control: Arc<TurnControlCoordinator>,
    ) -> Self {
        Self {
            groups,
            characters,
            sessions,
            world,
            notifier,
            positions,
            party,
            turn_control,
        }
    }

    /// Make `hero_id` the character the session plays, demoting the current
    /// master to a ghost hero of the same group.
    ///
    /// Every precondition is checked before anything is touched, so an
    /// error leaves groups, parties and characters exactly as they were.
    pub fn switch_master(
        &self,
        master_id: CharacterId,
        hero_id: CharacterId,
    ) -> Result<HeroOutcome, HeroError> {
        let guard = self.groups.lock_membership();

        let (mut old_master, mut hero) = self.check_switch(master_id, hero_id)?;
        let account = old_master.account_id;
        let Some(position) = old_master.position() else {
            return Err(HeroError::UnknownPosition);
        };

        self.groups.remove(&guard, old_master.id, hero.id);
        self.positions.discard(hero.id);

        self.positions.capture(&old_master);
        self.world.detach(old_master.id);
        old_master.ghost = true;
        old_master.online = false;

        self.groups.rekey(&guard, old_master.id, hero.id);
        self.groups.insert(&guard, hero.id, old_master.id);
        self.turn_control
            .transfer_manual_control(old_master.id, hero.id);

        let existing_party = old_master
            .party
            .filter(|id| self.party.get(*id).is_some());
        if existing_party.is_none() {
            old_master.party = None;
            hero.party = None;
            self.party.join(&mut hero, &mut old_master);
        }

        hero.place(position);
        hero.ghost = false;
        hero.online = true;
        if let Some(cell) = position.cell {
            self.world.attach(hero.id, position.map, cell);
        }
        self.characters.set_active_character(account, hero.id);
        if !self.sessions.switch_incarnation(account, hero.id) {
            tracing::warn!(
                master_id = %hero.id,
                "Session refused the new incarnation after master switch"
            );
        }

        self.characters.save(&old_master);
        self.characters.save(&hero);

        if let Some(party_id) = existing_party {
            self.party.promote(party_id, &hero);
        }

        tracing::info!(
            old_master_id = %old_master.id,
            new_master_id = %hero.id,
            heroes = self.groups.group_len(hero.id),
            "Master switched"
        );
        Ok(HeroOutcome::new(
            hero.id,
            format!("You are now playing {}", hero.name),
        ))
    }

    /// Put every hero back on the master's cell after a fight, ready for
    /// the next one. Returns how many heroes were restored.
    pub fn restore_group_after_fight(&self, master_id: CharacterId) -> usize {
        let Some(master) = self.characters.get(master_id) else {
            return 0;
        };

        let mut restored = 0;
        for hero_id in self.groups.heroes_of(master_id) {
            let Some(mut hero) = self.characters.get(hero_id) else {
                continue;
            };
            if let Some(map) = master.map {
                hero.map = Some(map);
                if master.cell.is_some() {
                    hero.cell = master.cell;
                }
            }
            hero.combat = None;
            hero.ready = true;
            self.characters.save(&hero);
            self.notifier
                .notify(master.account_id, ClientNotice::Vitals { character: hero_id });
            restored += 1;
        }

        self.turn_control.release_control(master_id);
        if restored > 0 {
            tracing::debug!(master_id = %master_id, restored, "Group restored after fight");
        }
        restored
    }

    fn check_switch(
        &self,
        master_id: CharacterId,
        hero_id: CharacterId,
    ) -> Result<(Character, Character), HeroError> {
        let master = self
            .characters
            .get(master_id)
            .filter(|m| !m.ghost)
            .ok_or(HeroError::InvalidMaster)?;
        if hero_id == master_id {
            return Err(HeroError::AlreadyIncarnated);
        }
        if !self.groups.contains(master_id, hero_id) {
            return Err(HeroError::NotFound);
        }
        let hero = self.characters.get(hero_id).ok_or(HeroError::NotFound)?;
        if !master.same_account(&hero) {
            return Err(HeroError::CrossAccount);
        }
        if master.is_in_combat() {
            return Err(HeroError::InCombat);
        }
        if master.is_busy() {
            return Err(HeroError::ActionInProgress);
        }
        if !master.has_resolved_position() {
            return Err(HeroError::UnknownPosition);
        }
        if !self.sessions.is_connected(master.account_id) {
            return Err(HeroError::NoSession);
        }
        Ok((master, hero))
    }
}
