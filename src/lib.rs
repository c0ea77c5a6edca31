//! Autonomous agent navigation and behavior for 3D worlds
//!
//! This crate provides:
//! - Tile graph construction and occupancy maintenance over terrain
//! - A* pathfinding with Euclidean costs
//! - Sight/hearing target detection scoring
//! - A per-tick behavior state machine with steering and stuck recovery
//! - rapier3d-backed implementations of the world boundary oracles

pub mod ai;
pub mod config;
pub mod graph;
pub mod physics;
pub mod world;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        BehaviorConfig, BehaviorController, BehaviorState, LocomotionConfig, LocomotionController,
        MotionCommand, Path, PerceptionConfig, WanderAnchor, find_path,
    };
    pub use crate::config::{AgentProfile, ConfigError};
    pub use crate::graph::{GraphConfig, TerrainBounds, Tile, TileCoord, TileGraph};
    pub use crate::physics::NavPhysics;
    pub use crate::world::{
        AgentEvent, AiPolicy, DamageResponse, EventQueue, ExternalSignals, Health,
        HeightSampler, ObstacleRaycaster, OccupancyOracle, Pose, Simulation, Spawn,
    };
    pub use glam::{Quat, Vec2, Vec3};
}
