//! Cell state model
//!
//! A cell holds one state from a closed set. Fire comes in two flavours that
//! share the same lifecycle: an intensity-graded fire (shared-fire model) and
//! an owner-tagged fire (per-worker model) that can only spread among cells
//! with the same owner id.

use serde::{Deserialize, Serialize};

/// Identifier of the worker that owns a region or ignited a fire
pub type OwnerId = u16;

/// Fuel age of a tree cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelAge {
    Young,
    Mature,
    Old,
}

/// Fire severity in the shared-fire model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FireIntensity {
    Low,
    Medium,
    High,
}

impl FireIntensity {
    /// All intensities, weakest first
    pub const ALL: [FireIntensity; 3] = [Self::Low, Self::Medium, Self::High];

    /// One level hotter, saturating at `High`
    #[must_use]
    pub fn intensified(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    /// Ordinal level (0 = Low)
    pub fn level(self) -> u16 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

/// State of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Bare ground, never burns
    Empty,
    /// Unburned fuel
    Tree(FuelAge),
    /// Burning, shared-fire model
    Fire(FireIntensity),
    /// Burning, per-worker model (tagged with the igniting owner)
    OwnedFire(OwnerId),
    /// Fire has gone out
    Burned,
    /// Terminal
    Ash,
    /// Never burns
    Water,
}

impl Cell {
    pub const EMPTY: u8 = 0;
    pub const TREE_YOUNG: u8 = 1;
    pub const TREE_MATURE: u8 = 2;
    pub const TREE_OLD: u8 = 3;
    pub const FIRE_LOW: u8 = 4;
    pub const FIRE_MEDIUM: u8 = 5;
    pub const FIRE_HIGH: u8 = 6;
    pub const BURNED: u8 = 7;
    pub const ASH: u8 = 8;
    pub const WATER: u8 = 9;

    /// Integer code from the closed enumeration `0..=9`
    ///
    /// Owner-tagged fire has no intensity and reports the base fire code;
    /// its owner is available through [`Cell::tag`].
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => Self::EMPTY,
            Cell::Tree(FuelAge::Young) => Self::TREE_YOUNG,
            Cell::Tree(FuelAge::Mature) => Self::TREE_MATURE,
            Cell::Tree(FuelAge::Old) => Self::TREE_OLD,
            Cell::Fire(FireIntensity::Low) | Cell::OwnedFire(_) => Self::FIRE_LOW,
            Cell::Fire(FireIntensity::Medium) => Self::FIRE_MEDIUM,
            Cell::Fire(FireIntensity::High) => Self::FIRE_HIGH,
            Cell::Burned => Self::BURNED,
            Cell::Ash => Self::ASH,
            Cell::Water => Self::WATER,
        }
    }

    /// Intensity level for shared fire, owner id for owned fire, 0 otherwise
    pub fn tag(self) -> u16 {
        match self {
            Cell::Fire(intensity) => intensity.level(),
            Cell::OwnedFire(owner) => owner,
            _ => 0,
        }
    }

    /// Unburned fuel that may ignite
    pub fn is_flammable(self) -> bool {
        matches!(self, Cell::Tree(_))
    }

    /// Currently burning (either model)
    pub fn is_burning(self) -> bool {
        matches!(self, Cell::Fire(_) | Cell::OwnedFire(_))
    }

    /// Never changes state
    pub fn is_absorbing(self) -> bool {
        matches!(self, Cell::Empty | Cell::Water | Cell::Ash)
    }

    /// Whether `self -> next` is a legal single-step transition
    pub fn can_become(self, next: Cell) -> bool {
        if self == next {
            return true;
        }
        match self {
            Cell::Tree(_) => next.is_burning(),
            Cell::Fire(from) => match next {
                Cell::Burned => true,
                Cell::Fire(to) => to > from,
                _ => false,
            },
            Cell::OwnedFire(_) => next == Cell::Burned,
            Cell::Burned => next == Cell::Ash,
            Cell::Empty | Cell::Water | Cell::Ash => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_cover_zero_to_nine() {
        let cells = [
            Cell::Empty,
            Cell::Tree(FuelAge::Young),
            Cell::Tree(FuelAge::Mature),
            Cell::Tree(FuelAge::Old),
            Cell::Fire(FireIntensity::Low),
            Cell::Fire(FireIntensity::Medium),
            Cell::Fire(FireIntensity::High),
            Cell::Burned,
            Cell::Ash,
            Cell::Water,
        ];
        let codes: Vec<u8> = cells.iter().map(|c| c.code()).collect();
        assert_eq!(codes, (0..=9).collect::<Vec<u8>>());
    }

    #[test]
    fn test_owned_fire_reports_owner_tag() {
        let cell = Cell::OwnedFire(3);
        assert_eq!(cell.code(), Cell::FIRE_LOW);
        assert_eq!(cell.tag(), 3);
        assert_eq!(Cell::Fire(FireIntensity::High).tag(), 2);
        assert_eq!(Cell::Water.tag(), 0);
    }

    #[test]
    fn test_intensify_saturates() {
        assert_eq!(FireIntensity::Low.intensified(), FireIntensity::Medium);
        assert_eq!(FireIntensity::High.intensified(), FireIntensity::High);
    }

    #[test]
    fn test_lifecycle_rules() {
        let tree = Cell::Tree(FuelAge::Old);
        assert!(tree.can_become(Cell::Fire(FireIntensity::Low)));
        assert!(tree.can_become(Cell::OwnedFire(0)));
        assert!(!tree.can_become(Cell::Burned));

        assert!(Cell::Fire(FireIntensity::Low).can_become(Cell::Burned));
        assert!(!Cell::Fire(FireIntensity::High).can_become(Cell::Fire(FireIntensity::Low)));

        assert!(Cell::Burned.can_become(Cell::Ash));
        assert!(!Cell::Burned.can_become(Cell::Fire(FireIntensity::Low)));
        assert!(!Cell::Burned.can_become(tree));

        for absorbing in [Cell::Empty, Cell::Water, Cell::Ash] {
            assert!(absorbing.is_absorbing());
            assert!(!absorbing.can_become(Cell::Burned));
        }
    }
}
