//! A* pathfinding over a tile graph
//!
//! Stateless shortest-path search. Edge cost and heuristic are both the
//! Euclidean distance between tile centers, so diagonal steps genuinely cost
//! ~1.414x an orthogonal step and the heuristic stays admissible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::graph::{TileCoord, TileGraph};

/// Result of a path search.
///
/// Coordinates run from start to goal inclusive; an empty sequence means the
/// goal is unreachable, which is a normal outcome rather than an error.
#[derive(Debug, Clone, Default)]
pub struct Path {
    /// Tile coordinates from start to goal inclusive
    pub coords: Vec<TileCoord>,
    /// Summed edge cost in world units
    pub cost: f32,
}

impl Path {
    /// The empty (unreachable) path
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no path was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of tiles in the path
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Resolve the path to world-space tile centers
    #[must_use]
    pub fn waypoints(&self, graph: &TileGraph) -> Vec<Vec3> {
        self.coords
            .iter()
            .filter_map(|&coord| graph.get(coord).map(|tile| tile.center()))
            .collect()
    }
}

/// Open-set entry.
///
/// Ordered ascending by `f_cost`; ties break by insertion order (the node
/// pushed earliest wins), which keeps results reproducible on symmetric
/// grids.
#[derive(Debug, Clone, Copy)]
struct Node {
    coord: TileCoord,
    g_cost: f32,
    f_cost: f32,
    seq: u64,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.seq == other.seq
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap; lower sequence wins ties
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a minimum-cost tile sequence from `start` to `goal`.
///
/// Impassable tiles are excluded from expansion except the start and goal
/// themselves, so an agent standing on (or ordered onto) a contested tile is
/// never trapped by the search. Returns an empty path when either endpoint
/// is off the graph or the open set empties without reaching the goal.
#[must_use]
pub fn find_path(graph: &TileGraph, start: TileCoord, goal: TileCoord) -> Path {
    let Some(start_tile) = graph.get(start) else {
        return Path::empty();
    };
    let Some(goal_tile) = graph.get(goal) else {
        return Path::empty();
    };

    if start == goal {
        return Path {
            coords: vec![start],
            cost: 0.0,
        };
    }

    let goal_center = goal_tile.center();

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<TileCoord, TileCoord> = FxHashMap::default();
    let mut g_score: FxHashMap<TileCoord, f32> = FxHashMap::default();
    let mut seq = 0u64;

    g_score.insert(start, 0.0);
    open_set.push(Node {
        coord: start,
        g_cost: 0.0,
        f_cost: start_tile.center().distance(goal_center),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            // Reconstruct path
            let mut coords = vec![goal];
            let mut cursor = goal;
            while let Some(&previous) = came_from.get(&cursor) {
                coords.push(previous);
                cursor = previous;
            }
            coords.reverse();

            return Path {
                coords,
                cost: current.g_cost,
            };
        }

        // Stale heap entry superseded by a cheaper route
        if current.g_cost > g_score.get(&current.coord).copied().unwrap_or(f32::INFINITY) {
            continue;
        }

        let Some(current_tile) = graph.get(current.coord) else {
            continue;
        };
        let current_center = current_tile.center();

        for neighbor in graph.neighbors(current.coord) {
            let Some(tile) = graph.get(neighbor) else {
                continue;
            };
            // Passability gate; endpoints stay traversable regardless
            if !tile.is_passable() && neighbor != goal && neighbor != start {
                continue;
            }

            let tentative = current.g_cost + current_center.distance(tile.center());
            if tentative < g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY) {
                came_from.insert(neighbor, current.coord);
                g_score.insert(neighbor, tentative);
                seq += 1;
                open_set.push(Node {
                    coord: neighbor,
                    g_cost: tentative,
                    f_cost: tentative + tile.center().distance(goal_center),
                    seq,
                });
            }
        }
    }

    // Open set exhausted without reaching the goal
    Path::empty()
}
