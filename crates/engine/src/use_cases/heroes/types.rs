//! Result types for hero operations.

use std::fmt;

use warband_domain::{Character, CharacterId};

/// Successful hero command: the character acted on and a message for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroOutcome {
    pub character: CharacterId,
    pub message: String,
}

impl HeroOutcome {
    pub fn new(character: CharacterId, message: impl Into<String>) -> Self {
        Self {
            character,
            message: message.into(),
        }
    }
}

/// One line of the roster listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: CharacterId,
    pub name: String,
    pub level: u16,
}

impl From<&Character> for RosterEntry {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            level: character.level,
        }
    }
}

/// Heroes currently recruited plus the account characters still available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroRoster {
    pub active: Vec<RosterEntry>,
    pub available: Vec<RosterEntry>,
    pub max: usize,
}

impl fmt::Display for HeroRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active heroes ({}/{}):", self.active.len(), self.max)?;
        if self.active.is_empty() {
            writeln!(f, "  none")?;
        }
        for entry in &self.active {
            writeln!(f, "  {} (level {}) [{}]", entry.name, entry.level, entry.id)?;
        }
        write!(f, "Available:")?;
        if self.available.is_empty() {
            write!(f, "\n  none")?;
        }
        for entry in &self.available {
            write!(f, "\n  {} (level {}) [{}]", entry.name, entry.level, entry.id)?;
        }
        Ok(())
    }
}
