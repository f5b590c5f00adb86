//! Value objects - Immutable objects defined by their attributes

mod position;

pub use position::{Facing, Position, SavePoint};
