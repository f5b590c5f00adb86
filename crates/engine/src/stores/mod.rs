//! In-memory state storage modules.
//!
//! Stores manage runtime state owned by the hero subsystem:
//! - `HeroGroupStore` - Master/hero membership and reverse index
//! - `SnapshotStore` - Real positions of ghosted characters
//! - `ControlContextStore` - Turn handoffs and incarnation anchors
//! - `PartyStore` - Visible party grouping

pub mod control;
pub mod hero_groups;
pub mod party;
pub mod snapshots;

// Re-export store types
pub use control::{ControlContext, ControlContextStore};
pub use hero_groups::{HeroGroupStore, MembershipGuard};
pub use party::PartyStore;
pub use snapshots::{PositionSnapshot, SnapshotStore};
