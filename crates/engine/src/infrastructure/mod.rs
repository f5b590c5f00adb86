//! Infrastructure implementations.
//!
//! Contains port traits, their in-memory implementations and settings.

pub mod clock;
pub mod memory;
pub mod ports;
pub mod settings;
