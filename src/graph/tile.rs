//! Cells of the navigable grid

use std::fmt;

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::world::OverlapHit;

/// Integer grid coordinates of a tile.
///
/// Unique within a graph; `z` selects the row, `x` the tile within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    /// Create a coordinate pair
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance between two grid coordinates, in tiles
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A cell of the navigable grid.
///
/// Carries the sampled ground height, passability, and the world object
/// currently contesting the cell, if any. Tiles are created by
/// [`TileGraph::build`](crate::graph::TileGraph::build) and mutated in place
/// by occupancy updates; they are never destroyed except with the graph.
#[derive(Debug, Clone)]
pub struct Tile {
    coord: TileCoord,
    center: Vec3,
    size: f32,
    thickness: f32,
    passable: bool,
    contested_by: Option<Entity>,
}

impl Tile {
    pub(crate) fn new(coord: TileCoord, center: Vec3, size: f32, thickness: f32) -> Self {
        Self {
            coord,
            center,
            size,
            thickness,
            passable: true,
            contested_by: None,
        }
    }

    /// Grid coordinates of this tile
    #[must_use]
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// World-space center, with `y` at the sampled ground height plus half
    /// the tile thickness
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Horizontal extent of the tile in world units
    #[must_use]
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Vertical extent of the tile in world units
    #[must_use]
    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    /// Half-extents of the occupancy-query footprint
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.size, self.thickness, self.size) / 2.0
    }

    /// Whether an agent may occupy or path through this tile
    #[must_use]
    pub fn is_passable(&self) -> bool {
        self.passable
    }

    /// The world object currently overlapping this tile, if any
    #[must_use]
    pub fn contested_by(&self) -> Option<Entity> {
        self.contested_by
    }

    /// Recompute passability from a fresh set of overlap hits.
    ///
    /// A blocking contester takes precedence as `contested_by`; an object
    /// carrying the passable tag may contest the tile without blocking it.
    pub(crate) fn apply_overlaps(&mut self, hits: &[OverlapHit]) {
        let blocking = hits.iter().find(|hit| !hit.passable_tag);
        self.contested_by = blocking.or_else(|| hits.first()).map(|hit| hit.object);
        self.passable = blocking.is_none();
    }

    /// An object entered the tile's footprint (trigger-style notification)
    pub(crate) fn overlap_enter(&mut self, object: Entity, passable_tag: bool) {
        self.contested_by = Some(object);
        self.passable = passable_tag;
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (y = {})", self.coord, self.center.y)
    }
}
