//! Group registry: which heroes belong to which master.
//!
//! Every membership change runs under the store's membership lock. Lookups
//! (`is_hero`, `find_master`, `active_heroes`) go straight to the concurrent
//! maps and never wait on it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use warband_domain::{Character, CharacterId};

use crate::infrastructure::ports::{CharacterStore, WorldPort};
use crate::stores::{HeroGroupStore, MembershipGuard};

use super::directory::HeroDirectory;
use super::error::HeroError;
use super::party::PartyMembership;
use super::position::PositionVirtualizer;
use super::turn_control::TurnControlCoordinator;
use super::types::{HeroOutcome, HeroRoster, RosterEntry};

pub struct GroupRegistry {
    groups: Arc<HeroGroupStore>,
    directory: Arc<HeroDirectory>,
    characters: Arc<dyn CharacterStore>,
    world: Arc<dyn WorldPort>,
    positions: Arc<PositionVirtualizer>,
    party: Arc<PartyMembership>,
    turn_control: Arc<TurnControlCoordinator>,
    max_heroes: usize,
}

impl GroupRegistry {
    pub fn new(
        groups: Arc<HeroGroupStore>,
        directory: Arc<HeroDirectory>,
        characters: Arc<dyn CharacterStore>,
        world: Arc<dyn WorldPort>,
        positions: Arc<PositionVirtualizer>,
        party: Arc<PartyMembership>,
        turn_control: Arc<TurnControlCoordinator>,
        max_heroes: usize,
    ) -> Self {
        Self {
            groups,
            directory,
            characters,
            world,
            positions,
            party,
            turn_control,
            max_heroes,
        }
    }

    pub fn max_heroes(&self) -> usize {
        self.max_heroes
    }

    /// Recruit `candidate_id` into `master_id`'s group.
    ///
    /// The candidate's real position is snapshotted, it leaves the physical
    /// map and follows the master as a ghost from now on.
    pub fn add_hero(
        &self,
        master_id: CharacterId,
        candidate_id: CharacterId,
    ) -> Result<HeroOutcome, HeroError> {
        let guard = self.groups.lock_membership();

        let mut master = self
            .characters
            .get(master_id)
            .filter(|m| !m.ghost)
            .ok_or(HeroError::InvalidMaster)?;
        if candidate_id == master_id {
            return Err(HeroError::SelfReference);
        }
        let mut hero = self
            .characters
            .get(candidate_id)
            .ok_or(HeroError::NotFound)?;
        if !master.same_account(&hero) {
            return Err(HeroError::CrossAccount);
        }
        if hero.online {
            return Err(HeroError::AlreadyOnline);
        }
        if self.groups.is_hero(candidate_id) {
            return Err(HeroError::AlreadyActive);
        }
        if self.groups.group_len(master_id) >= self.max_heroes {
            return Err(HeroError::LimitReached {
                max: self.max_heroes,
            });
        }
        let position = master.position().ok_or(HeroError::UnknownPosition)?;

        self.positions.capture(&hero);
        self.world.detach(hero.id);
        hero.place(position);
        self.groups.insert(&guard, master.id, hero.id);
        hero.ghost = true;
        self.party.join(&mut master, &mut hero);
        self.characters.save(&master);
        self.characters.save(&hero);

        self.turn_control.release_control(master.id);

        tracing::info!(
            master_id = %master.id,
            hero_id = %hero.id,
            heroes = self.groups.group_len(master.id),
            "Hero added to group"
        );
        Ok(HeroOutcome::new(
            hero.id,
            format!("{} joins the group as a hero", hero.name),
        ))
    }

    /// Send `hero_id` back to the world as an independent character.
    pub fn remove_hero(
        &self,
        master_id: CharacterId,
        hero_id: CharacterId,
    ) -> Result<HeroOutcome, HeroError> {
        let guard = self.groups.lock_membership();

        self.characters
            .get(master_id)
            .filter(|m| !m.ghost)
            .ok_or(HeroError::InvalidMaster)?;
        if !self.groups.has_group(master_id) {
            return Err(HeroError::NoGroup);
        }
        if !self.groups.contains(master_id, hero_id) {
            return Err(HeroError::NotActive);
        }

        let name = self
            .detach_hero(&guard, master_id, hero_id)
            .map(|h| h.name)
            .unwrap_or_else(|| hero_id.to_string());
        tracing::info!(master_id = %master_id, hero_id = %hero_id, "Hero removed from group");
        Ok(HeroOutcome::new(hero_id, format!("{name} is no longer a hero")))
    }

    /// Dismiss every hero of `master_id`. Returns how many were removed.
    pub fn remove_all_for_master(&self, master_id: CharacterId) -> usize {
        let guard = self.groups.lock_membership();
        let heroes = self.groups.heroes_of(master_id);
        for hero in &heroes {
            self.detach_hero(&guard, master_id, *hero);
        }
        if !heroes.is_empty() {
            tracing::info!(master_id = %master_id, removed = heroes.len(), "Group dissolved");
        }
        heroes.len()
    }

    /// Make sure `character_id` is nobody's hero before it enters the world
    /// on its own. Returns whether anything had to be undone.
    pub fn ensure_standalone(&self, character_id: CharacterId) -> bool {
        let guard = self.groups.lock_membership();

        if let Some(master_id) = self.groups.owner_of(character_id) {
            self.detach_hero(&guard, master_id, character_id);
            tracing::info!(
                character_id = %character_id,
                master_id = %master_id,
                "Character pulled out of hero group"
            );
            return true;
        }

        // Ghost flag left behind without a group (e.g. a demoted master).
        let Some(mut character) = self.characters.get(character_id) else {
            return false;
        };
        if !character.ghost {
            return false;
        }
        self.party.leave(&mut character);
        character.ghost = false;
        self.positions.restore_or_reload(&mut character);
        self.characters.save(&character);
        tracing::debug!(character_id = %character_id, "Cleared orphan ghost flag");
        true
    }

    pub fn is_hero(&self, character: CharacterId) -> bool {
        self.directory.is_hero(character)
    }

    pub fn find_master(&self, hero: CharacterId) -> Option<Character> {
        self.directory.find_master(hero)
    }

    pub fn active_heroes(&self, master: CharacterId) -> Vec<CharacterId> {
        self.directory.active_heroes(master)
    }

    /// The character whose session should receive notices about `character`:
    /// its master for a hero, itself otherwise.
    pub fn notice_recipient(&self, character: CharacterId) -> CharacterId {
        self.directory.master_id(character).unwrap_or(character)
    }

    /// Active heroes plus the account characters that could still be recruited.
    pub fn roster(&self, master_id: CharacterId) -> Result<HeroRoster, HeroError> {
        let master = self
            .characters
            .get(master_id)
            .ok_or(HeroError::InvalidMaster)?;

        let active = self
            .groups
            .heroes_of(master_id)
            .into_iter()
            .filter_map(|id| self.characters.get(id))
            .map(|c| RosterEntry::from(&c))
            .collect();
        let available = self
            .characters
            .account_characters(master.account_id)
            .iter()
            .filter(|c| c.id != master_id && !self.groups.is_hero(c.id))
            .map(RosterEntry::from)
            .collect();

        Ok(HeroRoster {
            active,
            available,
            max: self.max_heroes,
        })
    }

    /// Copy the master's map (and cell, when known) onto every hero.
    ///
    /// Called after a master moves. Heroes are ghosts, so only their
    /// records change. Returns how many heroes were updated.
    pub fn on_master_moved(&self, master_id: CharacterId) -> usize {
        if self.groups.is_hero(master_id) {
            return 0;
        }
        let Some(_guard) = PropagationGuard::enter(master_id) else {
            tracing::debug!(master_id = %master_id, "Skipped nested position propagation");
            return 0;
        };
        let Some(master) = self.characters.get(master_id) else {
            return 0;
        };
        let Some(map) = master.map else {
            return 0;
        };

        let mut updated = 0;
        for hero_id in self.groups.heroes_of(master_id) {
            let Some(mut hero) = self.characters.get(hero_id) else {
                continue;
            };
            hero.map = Some(map);
            if let Some(cell) = master.cell {
                hero.cell = Some(cell);
            }
            self.characters.save(&hero);
            updated += 1;
        }
        if updated > 0 {
            tracing::debug!(master_id = %master_id, map = %map, updated, "Propagated master position");
        }
        updated
    }

    /// Undo hero mode for one hero. The caller holds the membership lock.
    fn detach_hero(
        &self,
        guard: &MembershipGuard<'_>,
        master_id: CharacterId,
        hero_id: CharacterId,
    ) -> Option<Character> {
        match self.characters.get(master_id) {
            Some(master) => self.turn_control.release_for_hero(&master, hero_id),
            None => self.turn_control.release_control(master_id),
        }
        self.groups.remove(guard, master_id, hero_id);

        let Some(mut hero) = self.characters.get(hero_id) else {
            self.positions.discard(hero_id);
            return None;
        };
        self.party.leave(&mut hero);
        hero.ghost = false;
        if !self.positions.restore_or_reload(&mut hero) {
            tracing::debug!(hero_id = %hero_id, "No snapshot or save point, keeping last position");
        }
        self.characters.save(&hero);
        Some(hero)
    }
}

thread_local! {
    /// Masters whose move is being copied onto their heroes on this thread
    static PROPAGATING: RefCell<HashSet<CharacterId>> = RefCell::new(HashSet::new());
}

/// Marks a master as "propagating" on the current thread until dropped.
/// Other threads propagating the same master are not affected.
struct PropagationGuard {
    master: CharacterId,
}

impl PropagationGuard {
    fn enter(master: CharacterId) -> Option<Self> {
        PROPAGATING
            .with(|active| active.borrow_mut().insert(master))
            .then(|| Self { master })
    }
}

impl Drop for PropagationGuard {
    fn drop(&mut self) {
        let _ = PROPAGATING.try_with(|active| active.borrow_mut().remove(&self.master));
    }
}
