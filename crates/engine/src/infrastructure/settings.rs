//! Hero subsystem settings.
//!
//! Loaded once at startup (see `main.rs`) and injected into [`crate::App`];
//! library code never reads the environment itself.

use serde::{Deserialize, Serialize};

/// Hard ceiling on heroes per master.
pub const MAX_HEROES_CAP: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroSettings {
    /// Heroes a single master may recruit (1..=3)
    pub max_heroes_per_group: usize,
    /// When a restored cell is gone or taken, fall back to any free cell on the map
    pub restore_to_free_cell: bool,
}

impl Default for HeroSettings {
    fn default() -> Self {
        Self {
            max_heroes_per_group: MAX_HEROES_CAP,
            restore_to_free_cell: true,
        }
    }
}

impl HeroSettings {
    /// Read overrides from `WARBAND_MAX_HEROES` and `WARBAND_FREE_CELL_FALLBACK`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_heroes_per_group = lookup("WARBAND_MAX_HEROES")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_heroes_per_group);
        let restore_to_free_cell = lookup("WARBAND_FREE_CELL_FALLBACK")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.restore_to_free_cell);

        Self {
            max_heroes_per_group,
            restore_to_free_cell,
        }
        .normalized()
    }

    /// Clamp the hero limit into `1..=MAX_HEROES_CAP`.
    pub fn normalized(mut self) -> Self {
        self.max_heroes_per_group = self.max_heroes_per_group.clamp(1, MAX_HEROES_CAP);
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
