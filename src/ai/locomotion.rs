//! Destination steering with obstacle correction and stuck recovery
//!
//! Turns "move toward point P" into a per-tick velocity and facing command.
//! Facing turns at a bounded angular rate and movement is gated on roughly
//! facing the destination, so agents pivot in place instead of sliding
//! sideways. The controller never displaces the agent itself; the host
//! applies the emitted [`MotionCommand`].

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::world::{ObstacleRaycaster, Pose};

/// A destination closer than this is considered unchanged
const DESTINATION_EPSILON: f32 = 1e-3;

/// Tuning for one agent's steering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocomotionConfig {
    /// Walking speed in world units per second
    pub base_speed: f32,
    /// Speed multiplier while pursuing a target
    pub run_multiplier: f32,
    /// Maximum turn rate in degrees per second
    pub turn_rate: f32,
    /// Facing must be within this many degrees of the destination
    /// direction before movement speed is applied
    pub facing_threshold: f32,
    /// Distance at which a destination counts as reached
    pub arrival_radius: f32,
    /// How far back along the hit normal a blocked destination is pulled
    pub correction_distance: f32,
    /// Seconds between stuck-detection position samples
    pub stuck_check_interval: f32,
    /// Full recovery rotation in degrees; half is applied per report
    pub stuck_correction_degrees: f32,
    /// Stuck reports before the destination should be abandoned
    pub max_stuck_reports: u32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            base_speed: 2.0,
            run_multiplier: 2.0,
            turn_rate: 270.0,
            facing_threshold: 30.0,
            arrival_radius: 0.5,
            correction_distance: 1.0,
            stuck_check_interval: 0.5,
            stuck_correction_degrees: 45.0,
            max_stuck_reports: 4,
        }
    }
}

/// Per-tick movement command consumed by the host's physics collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionCommand {
    /// Desired velocity, zero while turning in place or arrived
    pub velocity: Vec3,
    /// Desired facing after this tick's bounded rotation
    pub facing: Vec3,
}

impl MotionCommand {
    /// Stand still with the given facing
    #[must_use]
    pub fn halt(facing: Vec3) -> Self {
        Self {
            velocity: Vec3::ZERO,
            facing,
        }
    }

    /// Whether this command moves the agent
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.velocity.length_squared() > 1e-8
    }
}

/// Rotate a horizontal vector around the y axis
fn rotate_y(v: Vec3, degrees: f32) -> Vec3 {
    Quat::from_rotation_y(degrees.to_radians()) * v
}

/// Unsigned horizontal angle between two directions, in degrees
fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let fa = Vec3::new(a.x, 0.0, a.z).normalize_or_zero();
    let fb = Vec3::new(b.x, 0.0, b.z).normalize_or_zero();
    if fa == Vec3::ZERO || fb == Vec3::ZERO {
        return 0.0;
    }
    fa.dot(fb).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Rotate `current` toward `desired` by at most `max_degrees`, around y
fn rotate_towards(current: Vec3, desired: Vec3, max_degrees: f32) -> Vec3 {
    let flat_desired = Vec3::new(desired.x, 0.0, desired.z).normalize_or_zero();
    if flat_desired == Vec3::ZERO {
        return current;
    }
    // Signed yaw from current to desired
    let signed = current
        .cross(flat_desired)
        .y
        .atan2(current.dot(flat_desired))
        .to_degrees();
    if signed.abs() <= max_degrees {
        return flat_desired;
    }
    rotate_y(current, signed.signum() * max_degrees)
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let d = b - a;
    (d.x * d.x + d.z * d.z).sqrt()
}

/// Whether a pose faces a point within an angular threshold in degrees
#[must_use]
pub fn is_facing(pose: &Pose, point: Vec3, threshold_deg: f32) -> bool {
    angle_between_deg(pose.facing, point - pose.position) <= threshold_deg
}

/// Per-agent steering state.
///
/// Holds the current destination, the rolling position sample used for stuck
/// detection, and the active recovery heading if one is in progress.
#[derive(Debug, Default)]
pub struct LocomotionController {
    destination: Option<Vec3>,
    previous_position: Option<Vec3>,
    stuck_timer: f32,
    stuck_reports: u32,
    escape_point: Option<Vec3>,
}

impl LocomotionController {
    /// Fresh controller with no destination
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current destination, if any
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Assign a destination.
    ///
    /// The stuck episode is reset only when the destination materially
    /// changes, so continuously re-aiming at a moving target does not defeat
    /// stuck detection.
    pub fn set_destination(&mut self, destination: Vec3) {
        if let Some(current) = self.destination {
            if current.distance_squared(destination) < DESTINATION_EPSILON * DESTINATION_EPSILON {
                return;
            }
        }
        self.destination = Some(destination);
        self.reset_episode();
    }

    /// Drop the destination and all episode state
    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.reset_episode();
    }

    /// Consecutive stuck reports for the current destination
    #[must_use]
    pub fn stuck_reports(&self) -> u32 {
        self.stuck_reports
    }

    /// Whether stuck recovery has been exhausted and the destination should
    /// be abandoned by the caller
    #[must_use]
    pub fn is_exhausted(&self, config: &LocomotionConfig) -> bool {
        self.stuck_reports >= config.max_stuck_reports
    }

    /// Whether the agent is within arrival distance of its destination
    #[must_use]
    pub fn has_arrived(&self, config: &LocomotionConfig, pose: &Pose) -> bool {
        self.destination
            .is_some_and(|d| horizontal_distance(pose.position, d) <= config.arrival_radius)
    }

    fn reset_episode(&mut self) {
        self.previous_position = None;
        self.stuck_timer = 0.0;
        self.stuck_reports = 0;
        self.escape_point = None;
    }

    /// Compute this tick's movement command.
    ///
    /// `speed` is the already-selected tier (walk or run); callers guard
    /// against zero speed before delegating here.
    pub fn tick(
        &mut self,
        config: &LocomotionConfig,
        pose: &Pose,
        speed: f32,
        dt: f32,
        raycaster: &dyn ObstacleRaycaster,
    ) -> MotionCommand {
        let Some(destination) = self.destination else {
            self.stuck_timer = 0.0;
            return MotionCommand::halt(pose.facing);
        };

        if self.has_arrived(config, pose) {
            self.reset_episode();
            return MotionCommand::halt(pose.facing);
        }

        // An active recovery heading overrides the destination until reached
        if let Some(escape) = self.escape_point {
            if horizontal_distance(pose.position, escape) <= config.arrival_radius {
                self.escape_point = None;
            }
        }
        let mut target = self.escape_point.unwrap_or(destination);

        let mut to_target = Vec3::new(
            target.x - pose.position.x,
            0.0,
            target.z - pose.position.z,
        );
        let mut direction = to_target.normalize_or_zero();
        let mut blocked_close = false;

        // Pull the target short of any obstacle on the direct line. Terrain
        // hits are expected (the ray skims the ground) and ignored.
        if direction != Vec3::ZERO {
            if let Some(hit) = raycaster.cast(pose.position, direction, to_target.length()) {
                if !hit.terrain {
                    blocked_close =
                        horizontal_distance(pose.position, hit.point) <= config.correction_distance;
                    target = hit.point + hit.normal * config.correction_distance;
                    to_target = Vec3::new(
                        target.x - pose.position.x,
                        0.0,
                        target.z - pose.position.z,
                    );
                    direction = to_target.normalize_or_zero();
                }
            }
        }

        let facing = if direction == Vec3::ZERO {
            pose.facing
        } else {
            rotate_towards(pose.facing, direction, config.turn_rate * dt)
        };

        let remaining = to_target.length();
        let facing_ok =
            direction != Vec3::ZERO && angle_between_deg(facing, direction) <= config.facing_threshold;
        let velocity = if facing_ok && remaining > config.arrival_radius {
            direction * speed
        } else {
            Vec3::ZERO
        };

        self.check_stuck(config, pose, velocity, blocked_close, dt);

        MotionCommand { velocity, facing }
    }

    /// Sample position every `stuck_check_interval` seconds and report a
    /// stuck episode when the agent tried to move but did not.
    fn check_stuck(
        &mut self,
        config: &LocomotionConfig,
        pose: &Pose,
        velocity: Vec3,
        blocked_close: bool,
        dt: f32,
    ) {
        if config.stuck_check_interval <= 0.0 {
            return;
        }
        self.stuck_timer += dt;
        if self.stuck_timer < config.stuck_check_interval {
            return;
        }
        self.stuck_timer = 0.0;

        let Some(previous) = self.previous_position else {
            self.previous_position = Some(pose.position);
            return;
        };
        self.previous_position = Some(pose.position);

        let trying_to_move = velocity.length_squared() > 1e-8;
        let displacement = pose.position.distance(previous);
        let no_progress = displacement < config.correction_distance / 4.0;

        if (trying_to_move && no_progress) || blocked_close {
            self.report_stuck(config, pose);
        } else {
            self.stuck_reports = 0;
            self.escape_point = None;
        }
    }

    fn report_stuck(&mut self, config: &LocomotionConfig, pose: &Pose) {
        self.stuck_reports += 1;
        debug!(
            "stuck report {} at {}",
            self.stuck_reports, pose.position
        );

        let Some(destination) = self.destination else {
            return;
        };
        let direct = Vec3::new(
            destination.x - pose.position.x,
            0.0,
            destination.z - pose.position.z,
        )
        .normalize_or_zero();
        if direct == Vec3::ZERO {
            return;
        }

        // Half the configured rotation per report, alternating sides so
        // consecutive recoveries probe both ways around the obstruction
        let half = config.stuck_correction_degrees / 2.0;
        let sign = if self.stuck_reports % 2 == 0 { -1.0 } else { 1.0 };
        let heading = rotate_y(direct, sign * half);
        self.escape_point = Some(pose.position + heading * config.correction_distance * 4.0);
    }
}
