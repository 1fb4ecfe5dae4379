//! Fixed wind: a compass direction plus a scalar speed

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl WindDirection {
    pub const ALL: [WindDirection; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Unit `(row, col)` offset; north is toward row 0
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::N => (-1, 0),
            Self::NE => (-1, 1),
            Self::E => (0, 1),
            Self::SE => (1, 1),
            Self::S => (1, 0),
            Self::SW => (1, -1),
            Self::W => (0, -1),
            Self::NW => (-1, -1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindDirection {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|dir| dir.name() == upper)
            .ok_or_else(|| SimError::InvalidWindDirection(s.to_string()))
    }
}

/// Process-wide wind for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: WindDirection,
    /// Dimensionless speed used by the spread multipliers
    pub speed: f32,
}

impl Default for Wind {
    fn default() -> Self {
        Self {
            direction: WindDirection::SE,
            speed: 2.5,
        }
    }
}

impl Wind {
    pub fn new(direction: WindDirection, speed: f32) -> Self {
        Self { direction, speed }
    }

    /// Spread multiplier for a neighbor at offset `(dr, dc)` from the target cell
    ///
    /// `1 + speed * with_gain` when the offset matches the wind offset,
    /// `1 - speed * against_damping` when it is the exact opposite, 1 otherwise.
    pub fn factor(&self, dr: i32, dc: i32, with_gain: f32, against_damping: f32) -> f32 {
        let (wr, wc) = self.direction.offset();
        if (dr, dc) == (wr, wc) {
            1.0 + self.speed * with_gain
        } else if (-dr, -dc) == (wr, wc) {
            1.0 - self.speed * against_damping
        } else {
            1.0
        }
    }
}
