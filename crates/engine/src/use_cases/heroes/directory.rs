//! Read-only hero lookups shared by the registry and the turn coordinator.

use std::sync::Arc;

use warband_domain::{Character, CharacterId};

use crate::infrastructure::ports::CharacterStore;
use crate::stores::HeroGroupStore;

/// Lock-free answers to "is this a hero" and "who owns it".
pub struct HeroDirectory {
    groups: Arc<HeroGroupStore>,
    characters: Arc<dyn CharacterStore>,
}

impl HeroDirectory {
    pub fn new(groups: Arc<HeroGroupStore>, characters: Arc<dyn CharacterStore>) -> Self {
        Self { groups, characters }
    }

    pub fn is_hero(&self, character: CharacterId) -> bool {
        self.groups.is_hero(character)
    }

    pub fn master_id(&self, hero: CharacterId) -> Option<CharacterId> {
        self.groups.owner_of(hero)
    }

    /// Resolve the master record of a hero.
    ///
    /// Falls back to the hero's account table when the master is not
    /// loaded in the world index.
    pub fn find_master(&self, hero: CharacterId) -> Option<Character> {
        let master_id = self.groups.owner_of(hero)?;
        if let Some(master) = self.characters.get(master_id) {
            return Some(master);
        }
        let hero = self.characters.get(hero)?;
        self.characters
            .account_characters(hero.account_id)
            .into_iter()
            .find(|c| c.id == master_id)
    }

    /// Heroes of `master` in activation order (a copy, never a live view).
    pub fn active_heroes(&self, master: CharacterId) -> Vec<CharacterId> {
        self.groups.heroes_of(master)
    }

    pub fn characters(&self) -> &Arc<dyn CharacterStore> {
        &self.characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCharacterStore;
    use warband_domain::AccountId;

    #[test]
    fn find_master_falls_back_to_account_table() {
        let account = AccountId::new();
        let master = Character::new(account, "Master");
        let hero = Character::new(account, "Hero");
        let (master_id, hero_id) = (master.id, hero.id);

        let groups = Arc::new(HeroGroupStore::new());
        {
            let guard = groups.lock_membership();
            groups.insert(&guard, master_id, hero_id);
        }

        let mut characters = MockCharacterStore::new();
        let hero_clone = hero.clone();
        characters.expect_get().returning(move |id| {
            if id == hero_id {
                Some(hero_clone.clone())
            } else {
                None
            }
        });
        let master_clone = master.clone();
        characters
            .expect_account_characters()
            .withf(move |a| *a == account)
            .returning(move |_| vec![master_clone.clone()]);

        let directory = HeroDirectory::new(groups, Arc::new(characters));

        assert_eq!(directory.find_master(hero_id).map(|m| m.id), Some(master_id));
        assert!(directory.is_hero(hero_id));
        assert!(directory.find_master(master_id).is_none());
    }
}
