use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest zoom level a tile key may address.
pub const MAX_ZOOM: u8 = 24;

/// Address of a tile in the zoom/x/y quadtree.
///
/// `x` grows eastward and `y` grows southward, both in `0..2^z`.
///
/// # Examples
///
/// ```
/// use geotiler_types::key::TileKey;
///
/// let root = TileKey::new(0, 0, 0);
/// let children = root.children();
/// assert_eq!(children[3], TileKey::new(1, 1, 1));
/// assert!(children.iter().all(|c| c.parent() == Some(root)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one side of the grid at this key's zoom.
    ///
    /// Returns `None` above [`MAX_ZOOM`].
    pub fn tiles_per_side(&self) -> Option<u32> {
        if self.z > MAX_ZOOM {
            None
        } else {
            Some(1u32 << self.z)
        }
    }

    /// True when zoom, column and row all fall inside the grid.
    pub fn is_valid(&self) -> bool {
        match self.tiles_per_side() {
            Some(n) => self.x < n && self.y < n,
            None => false,
        }
    }

    /// Wraps the column around the antimeridian so that `x` lands in `0..2^z`.
    ///
    /// Rows are never wrapped; a key with an out-of-range row stays invalid.
    pub fn wrapped(&self) -> Self {
        match self.tiles_per_side() {
            Some(n) => Self::new(self.z, self.x % n, self.y),
            None => *self,
        }
    }

    /// Returns the covering key one zoom level up, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.z == 0 {
            None
        } else {
            Some(Self::new(self.z - 1, self.x / 2, self.y / 2))
        }
    }

    /// The four keys one zoom level down, in row-major order.
    pub fn children(&self) -> [Self; 4] {
        let (z, x, y) = (self.z.saturating_add(1), self.x * 2, self.y * 2);
        [
            Self::new(z, x, y),
            Self::new(z, x + 1, y),
            Self::new(z, x, y + 1),
            Self::new(z, x + 1, y + 1),
        ]
    }

    /// Packs the key into a single integer, unique for every valid key.
    pub fn id(&self) -> u64 {
        let side = 1u64.checked_shl(self.z as u32).unwrap_or(0);
        ((side * self.y as u64) + self.x as u64) * 32 + self.z as u64
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
