//! Where a character stands: map, cell and facing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CellId, MapId};

/// One of the eight directions a character sprite can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    East,
    #[default]
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Facing {
    pub const ALL: [Facing; 8] = [
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
        Facing::North,
        Facing::NorthEast,
    ];

    /// Wire index (0 = east, clockwise).
    pub fn index(self) -> u8 {
        match self {
            Facing::East => 0,
            Facing::SouthEast => 1,
            Facing::South => 2,
            Facing::SouthWest => 3,
            Facing::West => 4,
            Facing::NorthWest => 5,
            Facing::North => 6,
            Facing::NorthEast => 7,
        }
    }
}

impl TryFrom<u8> for Facing {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Facing::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| DomainError::parse(format!("Facing index out of range: {}", value)))
    }
}

impl FromStr for Facing {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "east" | "e" => Ok(Facing::East),
            "south_east" | "southeast" | "se" => Ok(Facing::SouthEast),
            "south" | "s" => Ok(Facing::South),
            "south_west" | "southwest" | "sw" => Ok(Facing::SouthWest),
            "west" | "w" => Ok(Facing::West),
            "north_west" | "northwest" | "nw" => Ok(Facing::NorthWest),
            "north" | "n" => Ok(Facing::North),
            "north_east" | "northeast" | "ne" => Ok(Facing::NorthEast),
            other => Err(DomainError::parse(format!("Unknown facing: {}", other))),
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Facing::East => "east",
            Facing::SouthEast => "south_east",
            Facing::South => "south",
            Facing::SouthWest => "south_west",
            Facing::West => "west",
            Facing::NorthWest => "north_west",
            Facing::North => "north",
            Facing::NorthEast => "north_east",
        };
        f.write_str(name)
    }
}

/// A concrete location in the world. `cell` is `None` when the map is known
/// but the cell is not (e.g. a character loaded mid-transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub map: MapId,
    pub cell: Option<CellId>,
    pub facing: Facing,
}

impl Position {
    pub fn new(map: MapId, cell: Option<CellId>, facing: Facing) -> Self {
        Self { map, cell, facing }
    }

    pub fn with_cell(mut self, cell: CellId) -> Self {
        self.cell = Some(cell);
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell {
            Some(cell) => write!(f, "map {} cell {} facing {}", self.map, cell, self.facing),
            None => write!(f, "map {} (cell unknown) facing {}", self.map, self.facing),
        }
    }
}

/// Persisted respawn coordinates (the character's bound waypoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePoint {
    pub map: MapId,
    pub cell: CellId,
}

impl SavePoint {
    pub fn new(map: MapId, cell: CellId) -> Self {
        Self { map, cell }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_index_round_trips_through_try_from() {
        for facing in Facing::ALL {
            assert_eq!(Facing::try_from(facing.index()).ok(), Some(facing));
        }
        assert!(Facing::try_from(8).is_err());
    }

    #[test]
    fn facing_parses_short_and_long_names() {
        assert_eq!("NW".parse::<Facing>().ok(), Some(Facing::NorthWest));
        assert_eq!("south_east".parse::<Facing>().ok(), Some(Facing::SouthEast));
        assert!(matches!("up".parse::<Facing>(), Err(DomainError::Parse(_))));
    }

    #[test]
    fn facing_serializes_as_snake_case() {
        let json = serde_json::to_string(&Facing::SouthWest).unwrap();
        assert_eq!(json, "\"south_west\"");
        let back: Facing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Facing::SouthWest);
    }

    #[test]
    fn position_display_mentions_unknown_cell() {
        let known = Position::new(MapId::new(10), Some(CellId::new(200)), Facing::West);
        let unknown = Position::new(MapId::new(10), None, Facing::West);
        assert_eq!(known.to_string(), "map 10 cell 200 facing west");
        assert!(unknown.to_string().contains("cell unknown"));
    }
}
