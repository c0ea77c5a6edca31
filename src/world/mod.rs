//! Boundary contracts and agent components
//!
//! The core never touches the host engine's physics or animation directly;
//! it consumes the oracle traits below and emits commands/events. Agents are
//! plain `hecs` entities distinguished by capability components rather than
//! subclassing.

mod events;
mod sim;

pub use events::{AgentEvent, EventQueue};
pub use sim::Simulation;

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

// ============================================================================
// Oracle traits (implemented by the host; see crate::physics for rapier3d)
// ============================================================================

/// One object overlapping a queried footprint
#[derive(Debug, Clone, Copy)]
pub struct OverlapHit {
    /// The overlapping world object
    pub object: Entity,
    /// Whether the object carries the "passable" tag
    pub passable_tag: bool,
}

/// Occupancy query over an axis-aligned box footprint
pub trait OccupancyOracle {
    /// All objects overlapping the box at `center` with `half_extents`
    fn overlaps(&self, center: Vec3, half_extents: Vec3) -> Vec<OverlapHit>;
}

/// Terrain ground-height sampling
pub trait HeightSampler {
    /// World-space ground height at a horizontal position
    fn sample_height(&self, x: f32, z: f32) -> f32;
}

/// Hit reported by the obstacle raycast
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// World-space point of intersection
    pub point: Vec3,
    /// Surface normal at the hit
    pub normal: Vec3,
    /// The object that was struck, if it is a tracked world object
    pub object: Option<Entity>,
    /// Whether the hit surface is terrain (ignored for path correction)
    pub terrain: bool,
}

/// Short-range obstacle raycasting
pub trait ObstacleRaycaster {
    /// First hit along a ray, or `None` within `max_distance`
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

// ============================================================================
// Agent components
// ============================================================================

/// Position and facing of an agent.
///
/// `facing` is kept horizontal and unit-length.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: Vec3,
    pub facing: Vec3,
}

impl Pose {
    /// Create a pose; a degenerate facing defaults to +Z
    #[must_use]
    pub fn new(position: Vec3, facing: Vec3) -> Self {
        let flat = Vec3::new(facing.x, 0.0, facing.z);
        let facing = if flat.length_squared() > 1e-8 {
            flat.normalize()
        } else {
            Vec3::Z
        };
        Self { position, facing }
    }
}

/// Current and maximum health
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    /// Source of the most recent damage, used as the killer on death
    pub last_hit_by: Option<Entity>,
}

impl Health {
    /// Full health at the given maximum
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            last_hit_by: None,
        }
    }

    /// Whether the agent is still alive
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

/// Where the agent was spawned; anchors tethered wandering
#[derive(Debug, Clone, Copy)]
pub struct Spawn(pub Vec3);

/// Which AI drives the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiPolicy {
    /// No AI; the agent is driven externally (player input) or disabled
    None,
    /// The built-in behavior controller
    Basic,
}

/// How the agent reacts to incoming damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageResponse {
    /// Damage reduces health normally
    Normal,
    /// Damage is ignored entirely
    Immune,
}

/// Per-tick signals supplied by the host (physics, input, scripting)
#[derive(Debug, Clone, Copy)]
pub struct ExternalSignals {
    /// Whether the physics collaborator reports the agent grounded
    pub grounded: bool,
    /// Whether jump input is active this tick
    pub jump: bool,
    /// Whether movement is externally paused (cutscene, script)
    pub pause_movement: bool,
}

impl Default for ExternalSignals {
    fn default() -> Self {
        Self {
            grounded: true,
            jump: false,
            pause_movement: false,
        }
    }
}

/// Snapshot of a living agent, taken before the AI phase of a tick
#[derive(Debug, Clone, Copy)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_normalizes_facing() {
        let pose = Pose::new(Vec3::ZERO, Vec3::new(3.0, 5.0, 4.0));
        assert!(pose.facing.y.abs() < 1e-6);
        assert!((pose.facing.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_pose_degenerate_facing_defaults() {
        let pose = Pose::new(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(pose.facing, Vec3::Z);
    }

    #[test]
    fn test_health_alive() {
        let mut health = Health::new(10.0);
        assert!(health.is_alive());
        health.current = 0.0;
        assert!(!health.is_alive());
    }
}
