//! Character storage port.

use warband_domain::{AccountId, Character, CharacterId};

/// World/account index of characters, loaded or not.
///
/// Reads return owned snapshots; writes replace the whole record.
#[cfg_attr(test, mockall::automock)]
pub trait CharacterStore: Send + Sync {
    /// Resolve a character by id whether or not it is currently loaded.
    fn get(&self, id: CharacterId) -> Option<Character>;
    fn save(&self, character: &Character);
    /// Every character registered on an account.
    fn account_characters(&self, account_id: AccountId) -> Vec<Character>;
    /// Mark the character an account logs in as.
    fn set_active_character(&self, account_id: AccountId, id: CharacterId);
}
