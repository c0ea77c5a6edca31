//! The tile graph: build, lookup, neighbors, and occupancy maintenance

use glam::Vec3;
use hecs::Entity;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::{Tile, TileCoord};
use crate::world::{HeightSampler, OccupancyOracle};

/// Tolerance used when testing tile footprints against the terrain edge
const EDGE_EPSILON: f32 = 1e-4;

/// Horizontal extent of a terrain, in world units
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl TerrainBounds {
    /// Create bounds from min/max corners
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Size of the bounds along each axis
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether the bounds cover no horizontal area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size().x <= 0.0 || self.size().z <= 0.0
    }

    /// Whether a horizontal point lies within the bounds
    #[must_use]
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x - EDGE_EPSILON
            && x <= self.max.x + EDGE_EPSILON
            && z >= self.min.z - EDGE_EPSILON
            && z <= self.max.z + EDGE_EPSILON
    }
}

/// Tuning for graph construction and maintenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Horizontal extent of one tile in world units
    pub tile_size: f32,
    /// Vertical extent of one tile's occupancy footprint
    pub tile_thickness: f32,
    /// Keep tiles whose footprint pokes past the terrain edge
    pub allow_out_of_bounds: bool,
    /// Seconds between full occupancy rescans (0 disables the backstop)
    pub rescan_interval: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tile_size: 1.0,
            tile_thickness: 0.2,
            allow_out_of_bounds: false,
            rescan_interval: 2.0,
        }
    }
}

/// Errors reported when a graph cannot be built
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Tile size was zero, negative, or not finite
    InvalidTileSize(f32),
    /// Terrain bounds cover no horizontal area
    EmptyBounds,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTileSize(size) => write!(f, "invalid tile size: {size}"),
            Self::EmptyBounds => write!(f, "terrain bounds cover no area"),
        }
    }
}

impl std::error::Error for GraphError {}

/// The set of tiles covering one terrain, with lookup and neighbor queries.
///
/// Rows are keyed by the `z` grid coordinate; order within a row is not
/// meaningful. Tiles mutate in place as occupancy changes; the graph itself
/// lives as long as the terrain.
#[derive(Debug)]
pub struct TileGraph {
    rows: FxHashMap<i32, Vec<Tile>>,
    bounds: TerrainBounds,
    tile_size: f32,
    tile_thickness: f32,
    rescan_interval: f32,
    rescan_timer: f32,
}

impl TileGraph {
    /// Build a graph over a terrain's bounds.
    ///
    /// Iterates the bounds in steps of `tile_size` along both horizontal
    /// axes, samples the ground height for each cell, and evaluates initial
    /// passability through the occupancy oracle. Tiles whose footprint falls
    /// outside the bounds are discarded unless
    /// [`GraphConfig::allow_out_of_bounds`] is set.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for a non-positive tile size or empty bounds.
    pub fn build(
        bounds: TerrainBounds,
        config: &GraphConfig,
        height: &dyn HeightSampler,
        occupancy: &dyn OccupancyOracle,
    ) -> Result<Self, GraphError> {
        if !config.tile_size.is_finite() || config.tile_size <= 0.0 {
            return Err(GraphError::InvalidTileSize(config.tile_size));
        }
        if bounds.is_empty() {
            return Err(GraphError::EmptyBounds);
        }

        let mut graph = Self {
            rows: FxHashMap::default(),
            bounds,
            tile_size: config.tile_size,
            tile_thickness: config.tile_thickness,
            rescan_interval: config.rescan_interval,
            rescan_timer: 0.0,
        };

        let size = config.tile_size;
        let half = size / 2.0;
        let cols = (bounds.size().x / size).round() as i32;
        let rows = (bounds.size().z / size).round() as i32;

        let mut passable_count = 0usize;
        let mut impassable_count = 0usize;

        for zi in 0..rows {
            let cz = bounds.min.z + (zi as f32 + 0.5) * size;
            for xi in 0..cols {
                let cx = bounds.min.x + (xi as f32 + 0.5) * size;

                let inside = bounds.contains_xz(cx - half, cz - half)
                    && bounds.contains_xz(cx + half, cz + half);
                if !inside && !config.allow_out_of_bounds {
                    continue;
                }

                let y = height.sample_height(cx, cz);
                let center = Vec3::new(cx, y + config.tile_thickness / 2.0, cz);
                let coord = TileCoord::new(xi, zi);

                let mut tile = Tile::new(coord, center, size, config.tile_thickness);
                tile.apply_overlaps(&occupancy.overlaps(center, tile.half_extents()));

                if tile.is_passable() {
                    passable_count += 1;
                } else {
                    impassable_count += 1;
                }
                graph.rows.entry(coord.z).or_default().push(tile);
            }
        }

        debug!(
            "built tile graph: {} passable, {} impassable ({} total)",
            passable_count,
            impassable_count,
            passable_count + impassable_count
        );

        Ok(graph)
    }

    /// Terrain bounds the graph was built over
    #[must_use]
    pub fn bounds(&self) -> TerrainBounds {
        self.bounds
    }

    /// Horizontal extent of one tile
    #[must_use]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Grid coordinates of the cell containing a world position
    #[must_use]
    pub fn world_to_coord(&self, position: Vec3) -> TileCoord {
        TileCoord::new(
            ((position.x - self.bounds.min.x) / self.tile_size).floor() as i32,
            ((position.z - self.bounds.min.z) / self.tile_size).floor() as i32,
        )
    }

    /// Exact-match tile lookup; `None` outside the built range
    #[must_use]
    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.rows
            .get(&coord.z)?
            .iter()
            .find(|tile| tile.coord().x == coord.x)
    }

    fn get_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.rows
            .get_mut(&coord.z)?
            .iter_mut()
            .find(|tile| tile.coord().x == coord.x)
    }

    /// Tile containing a world position; `None` off the graph
    #[must_use]
    pub fn tile_at(&self, position: Vec3) -> Option<&Tile> {
        self.get(self.world_to_coord(position))
    }

    /// Up to 8 neighboring coordinates, in deterministic row-major order.
    ///
    /// Offsets with no corresponding tile (edge of the graph) are skipped.
    #[must_use]
    pub fn neighbors(&self, coord: TileCoord) -> SmallVec<[TileCoord; 8]> {
        let mut result = SmallVec::new();
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let candidate = TileCoord::new(coord.x + dx, coord.z + dz);
                if self.get(candidate).is_some() {
                    result.push(candidate);
                }
            }
        }
        result
    }

    /// Re-query the oracle for one tile and recompute its occupancy.
    ///
    /// Returns `false` when the coordinate is outside the built range.
    pub fn update_passability(
        &mut self,
        coord: TileCoord,
        occupancy: &dyn OccupancyOracle,
    ) -> bool {
        let Some(tile) = self.get_mut(coord) else {
            warn!("passability update requested for unknown tile {coord}");
            return false;
        };
        let hits = occupancy.overlaps(tile.center(), tile.half_extents());
        tile.apply_overlaps(&hits);
        true
    }

    /// Trigger-style notification: an object entered a tile's footprint
    pub fn notify_enter(&mut self, coord: TileCoord, object: Entity, passable_tag: bool) {
        if let Some(tile) = self.get_mut(coord) {
            tile.overlap_enter(object, passable_tag);
        }
    }

    /// Trigger-style notification: an object left a tile's footprint.
    ///
    /// The oracle is re-queried rather than trusted, since another object
    /// may still overlap the tile.
    pub fn notify_exit(&mut self, coord: TileCoord, occupancy: &dyn OccupancyOracle) {
        self.update_passability(coord, occupancy);
    }

    /// Advance the rescan timer; on expiry, re-query every tile's occupancy.
    ///
    /// This is the correctness backstop for objects that moved without a
    /// tile's own enter/exit notification firing.
    pub fn tick(&mut self, dt: f32, occupancy: &dyn OccupancyOracle) {
        if self.rescan_interval <= 0.0 {
            return;
        }
        self.rescan_timer += dt;
        if self.rescan_timer < self.rescan_interval {
            return;
        }
        self.rescan_timer = 0.0;

        for row in self.rows.values_mut() {
            for tile in row.iter_mut() {
                let hits = occupancy.overlaps(tile.center(), tile.half_extents());
                tile.apply_overlaps(&hits);
            }
        }
    }

    /// Iterate all tiles (row order is unspecified)
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.rows.values().flat_map(|row| row.iter())
    }

    /// Total number of tiles
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Number of currently passable tiles
    #[must_use]
    pub fn passable_count(&self) -> usize {
        self.iter().filter(|tile| tile.is_passable()).count()
    }

    /// Whether the graph holds no tiles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
