//! # Navigation Types
//!
//! The vocabulary shared by the catalog, the solver and the ring builder:
//! what a slot lets the ship do, how wide a tile is, and which level a tile
//! belongs to.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TubeError;

/// Navigability of one slot.
///
/// The ordinal is used to index [`NavTable`]; do not reorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum NavType {
    /// Nothing in the slot at all.
    Empty = 0,
    /// Open tile the ship can fly through and swerve across.
    Passable = 1,
    /// Blocked head-on, but the ship can swerve sideways through it.
    Swervible = 2,
    /// Blocked.
    Impassable = 3,
    /// Open straight ahead, but the ship cannot swerve in or out sideways.
    Tunnel = 4,
}

impl NavType {
    /// All navigation types in ordinal order.
    pub const ALL: [Self; 5] = [
        Self::Empty,
        Self::Passable,
        Self::Swervible,
        Self::Impassable,
        Self::Tunnel,
    ];

    /// Whether the ship can fly straight through this slot.
    #[inline]
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Empty | Self::Passable | Self::Tunnel)
    }

    /// Whether the ship can swerve sideways through this slot.
    #[inline]
    #[must_use]
    pub const fn is_swervible(self) -> bool {
        matches!(self, Self::Swervible | Self::Passable | Self::Empty)
    }

    /// Open and swervable: Passable or Empty.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Passable | Self::Empty)
    }

    /// Ordinal index for table lookups.
    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }
}

/// One value per [`NavType`], indexed by ordinal.
///
/// Every navigation type always has an entry, so a lookup can never miss.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavTable<T>([T; 5]);

impl<T> NavTable<T> {
    /// Builds a table from one value per type, in ordinal order.
    #[must_use]
    pub const fn new(values: [T; 5]) -> Self {
        Self(values)
    }

    /// Iterates `(type, value)` pairs in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (NavType, &T)> {
        NavType::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<NavType> for NavTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, nav: NavType) -> &T {
        &self.0[nav.ordinal()]
    }
}

impl<T> IndexMut<NavType> for NavTable<T> {
    #[inline]
    fn index_mut(&mut self, nav: NavType) -> &mut T {
        &mut self.0[nav.ordinal()]
    }
}

/// Width class of a tile, in 1-wide segment units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileWidth {
    /// Covers one segment.
    One,
    /// Covers three segments.
    Three,
}

impl TileWidth {
    /// Number of 1-wide segments this width covers.
    #[inline]
    #[must_use]
    pub const fn units(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Three => 3,
        }
    }

    /// The other width.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Three,
            Self::Three => Self::One,
        }
    }
}

/// Visual theme of a stretch of tube.
///
/// Levels play in declaration order; a run starting at one level plays it and
/// every later one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Metal corridors, trenches.
    Steel,
    /// The rift between.
    Rift,
    /// The inside of something alive.
    Flesh,
}

impl Level {
    /// All levels in play order.
    pub const ALL: [Self; 3] = [Self::Steel, Self::Rift, Self::Flesh];

    /// Lowercase name, also the segment name prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Steel => "steel",
            Self::Rift => "rift",
            Self::Flesh => "flesh",
        }
    }

    /// Index into per-level arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = TubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| TubeError::UnknownLevel(s.to_owned()))
    }
}
