use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Numeric identifiers handed out by the world layer (maps, cells, fighters).
macro_rules! define_numeric_id {
    ($name:ident, $repr:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name($repr);

        impl $name {
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self(value)
            }
        }
    };
}

// Entity IDs
define_id!(CharacterId);
define_id!(AccountId);
define_id!(PartyId);

// Combat IDs
define_id!(CombatId);
define_numeric_id!(CombatantId, i64);

// World geometry IDs
define_numeric_id!(MapId, u32);
define_numeric_id!(CellId, u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique_and_round_trip() {
        let a = CharacterId::new();
        let b = CharacterId::new();
        assert_ne!(a, b);
        assert_eq!(CharacterId::from_uuid(a.to_uuid()), a);
    }

    #[test]
    fn numeric_ids_display_their_value() {
        assert_eq!(MapId::new(7411).to_string(), "7411");
        assert_eq!(CellId::from(298).get(), 298);
        assert!(CombatantId::new(-1) < CombatantId::new(3));
    }
}
