//! Hero group membership: master -> heroes, plus the reverse index.
//!
//! Reads are lock-free. Every write takes a [`MembershipGuard`], which can
//! only be obtained from [`HeroGroupStore::lock_membership`], so the group
//! map and the reverse index always change together.

use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use warband_domain::CharacterId;

/// Proof that the caller holds the membership lock.
pub struct MembershipGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

#[derive(Default)]
pub struct HeroGroupStore {
    /// master -> heroes in activation order
    groups: DashMap<CharacterId, Vec<CharacterId>>,
    /// hero -> master
    owners: DashMap<CharacterId, CharacterId>,
    membership: Mutex<()>,
}

impl HeroGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize membership changes for the whole subsystem.
    pub fn lock_membership(&self) -> MembershipGuard<'_> {
        MembershipGuard {
            _guard: self
                .membership
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn owner_of(&self, hero: CharacterId) -> Option<CharacterId> {
        self.owners.get(&hero).map(|r| *r)
    }

    pub fn is_hero(&self, id: CharacterId) -> bool {
        self.owners.contains_key(&id)
    }

    pub fn has_group(&self, master: CharacterId) -> bool {
        self.groups.contains_key(&master)
    }

    /// Snapshot of a master's heroes in activation order.
    pub fn heroes_of(&self, master: CharacterId) -> Vec<CharacterId> {
        self.groups
            .get(&master)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn group_len(&self, master: CharacterId) -> usize {
        self.groups.get(&master).map(|r| r.len()).unwrap_or(0)
    }

    pub fn contains(&self, master: CharacterId, hero: CharacterId) -> bool {
        self.groups
            .get(&master)
            .map(|r| r.contains(&hero))
            .unwrap_or(false)
    }

    pub fn masters(&self) -> Vec<CharacterId> {
        self.groups.iter().map(|r| *r.key()).collect()
    }

    // -------------------------------------------------------------------------
    // Writes (membership lock required)
    // -------------------------------------------------------------------------

    /// Append `hero` to `master`'s group.
    pub fn insert(&self, _guard: &MembershipGuard<'_>, master: CharacterId, hero: CharacterId) {
        {
            let mut heroes = self.groups.entry(master).or_default();
            if !heroes.contains(&hero) {
                heroes.push(hero);
            }
        }
        self.owners.insert(hero, master);
    }

    /// Remove `hero` from `master`'s group, dropping the group once empty.
    /// Returns false if the hero was not in that group.
    pub fn remove(
        &self,
        _guard: &MembershipGuard<'_>,
        master: CharacterId,
        hero: CharacterId,
    ) -> bool {
        let removed = match self.groups.get_mut(&master) {
            Some(mut heroes) => {
                let before = heroes.len();
                heroes.retain(|h| *h != hero);
                heroes.len() != before
            }
            None => false,
        };
        if !removed {
            return false;
        }
        self.owners.remove_if(&hero, |_, owner| *owner == master);
        self.groups.remove_if(&master, |_, heroes| heroes.is_empty());
        true
    }

    /// Move `old`'s whole group (and every reverse entry) under `new`.
    pub fn rekey(&self, guard: &MembershipGuard<'_>, old: CharacterId, new: CharacterId) {
        let Some((_, heroes)) = self.groups.remove(&old) else {
            return;
        };
        for hero in heroes {
            self.insert(guard, new, hero);
        }
    }
}
