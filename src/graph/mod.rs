//! Spatial tile graph over arbitrary terrain
//!
//! Discretizes a terrain's horizontal extent into tiles carrying passability
//! and occupancy state, and answers lookup/neighbor queries for pathfinding.

mod tile;
mod tilegraph;

pub use tile::{Tile, TileCoord};
pub use tilegraph::{GraphConfig, GraphError, TerrainBounds, TileGraph};
