//! Agent intelligence: pathfinding, perception, behavior, locomotion
//!
//! The behavior controller is the orchestrator; perception scores targets,
//! the pathfinder plans tile routes, and locomotion turns destinations into
//! per-tick movement commands.

mod behavior;
mod locomotion;
mod pathfinding;
mod perception;

pub use behavior::{
    BehaviorConfig, BehaviorController, BehaviorState, DamageIntent, TickInputs, TickOutput,
    WanderAnchor,
};
pub use locomotion::{LocomotionConfig, LocomotionController, MotionCommand, is_facing};
pub use pathfinding::{Path, find_path};
pub use perception::PerceptionConfig;
