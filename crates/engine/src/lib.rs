//! Warband Engine library.
//!
//! Hero mode for a turn-based MMO server: a master character recruits
//! characters of its own account as heroes, steers them during their
//! combat turns and can swap places with them.
//!
//! ## Structure
//!
//! - `stores/` - Concurrent runtime state (groups, snapshots, handoffs, parties)
//! - `use_cases/` - Hero registry, turn control and party leadership
//! - `infrastructure/` - Port traits, in-memory adapters and settings
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

/// Populated in-memory world shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::{App, AppPorts};
