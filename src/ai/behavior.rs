//! Per-agent behavior state machine
//!
//! Evaluates a fixed rule order every tick and produces exactly one
//! [`BehaviorState`] plus a movement command. Nothing is diffed between
//! ticks; the state is recomputed from current world facts, which keeps the
//! controller trivially resumable after saves or teleports.
//!
//! Rule order: death, external pause, speed guard, target maintenance,
//! attack/interact holds, idle dwell, destination selection, path refresh,
//! steering, stuck abandonment, and finally state resolution with airborne
//! overrides.

use glam::{Vec2, Vec3};
use hecs::Entity;
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::locomotion::{is_facing, LocomotionConfig, LocomotionController, MotionCommand};
use crate::ai::pathfinding::find_path;
use crate::ai::perception::PerceptionConfig;
use crate::graph::{TileCoord, TileGraph};
use crate::world::{
    AgentEvent, EventQueue, ExternalSignals, Health, ObstacleRaycaster, Pose, Spawn,
    TargetSnapshot,
};

/// Coarse per-tick action classification, consumed by movement tiering and
/// the external animation sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Walk,
    Run,
    Attack,
    Jumping,
    Falling,
    /// Interaction in progress
    Touch,
    /// Single tick marking the end of an interaction
    Touchdown,
    /// Terminal; no transitions out
    Dead,
}

/// Where wander destinations are sampled around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WanderAnchor {
    /// Tethered to the spawn point
    Spawn,
    /// Free roam around wherever the agent currently is
    CurrentPosition,
}

/// Tuning for one agent's behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub wander_anchor: WanderAnchor,
    /// Half-extents of the wander rectangle, x and z
    pub wander_half_extents: Vec2,
    /// Idle dwell is drawn uniformly from this range, in seconds
    pub idle_duration_min: f32,
    pub idle_duration_max: f32,
    /// Damage per attack is drawn uniformly from this range
    pub damage_min: f32,
    pub damage_max: f32,
    /// How long the attack animation holds the state, in seconds
    pub attack_duration: f32,
    /// How long an interaction holds the `Touch` state, in seconds
    pub interact_duration: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            wander_anchor: WanderAnchor::Spawn,
            wander_half_extents: Vec2::new(6.0, 6.0),
            idle_duration_min: 1.0,
            idle_duration_max: 4.0,
            damage_min: 4.0,
            damage_max: 10.0,
            attack_duration: 0.8,
            interact_duration: 1.2,
        }
    }
}

/// Per-tick world facts supplied by the simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInputs {
    pub dt: f32,
    pub signals: ExternalSignals,
    /// Nearest living agent, candidate for acquisition
    pub nearest: Option<TargetSnapshot>,
    /// Fresh snapshot of the currently-tracked target; `None` once it dies
    pub current_target: Option<TargetSnapshot>,
    /// Fresh snapshot of the assigned interact target
    pub interact: Option<TargetSnapshot>,
}

/// Damage the behavior wants applied; the simulation owns actually applying
/// it (the attacker never mutates the victim)
#[derive(Debug, Clone, Copy)]
pub struct DamageIntent {
    pub target: Entity,
    pub amount: f32,
}

/// Result of one behavior tick
#[derive(Debug, Clone, Copy)]
pub struct TickOutput {
    pub state: BehaviorState,
    pub command: MotionCommand,
    pub damage: Option<DamageIntent>,
}

impl TickOutput {
    fn stationary(state: BehaviorState, facing: Vec3) -> Self {
        Self {
            state,
            command: MotionCommand::halt(facing),
            damage: None,
        }
    }
}

/// An animation-length state hold in progress
#[derive(Debug, Clone, Copy)]
enum Hold {
    Attack { remaining: f32 },
    Touch { remaining: f32 },
    Touchdown,
}

/// Per-agent behavior state.
///
/// Owns the current target, the interact assignment, idle/hold timers, and
/// the cached waypoint list for the active destination.
#[derive(Debug, Default)]
pub struct BehaviorController {
    state: BehaviorState,
    target: Option<Entity>,
    interact_target: Option<Entity>,
    hold: Option<Hold>,
    idle_timer: f32,
    idle_duration: Option<f32>,
    wander_point: Option<Vec3>,
    waypoints: Vec<Vec3>,
    waypoint_index: usize,
    path_goal: Option<TileCoord>,
    death_reported: bool,
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::Idle
    }
}

impl BehaviorController {
    /// Fresh controller in `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The state produced by the most recent tick
    #[must_use]
    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Currently-tracked pursuit target
    #[must_use]
    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Currently-assigned interact target
    #[must_use]
    pub fn interact_target(&self) -> Option<Entity> {
        self.interact_target
    }

    /// Assign or clear the interact target
    pub fn set_interact_target(&mut self, target: Option<Entity>) {
        self.interact_target = target;
    }

    /// Evaluate one tick for `entity`.
    ///
    /// First matching rule wins; exactly one state is produced. Damage and
    /// death are reported through the output and the event queue, never by
    /// mutating other agents directly.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<R: Rng>(
        &mut self,
        entity: Entity,
        config: &BehaviorConfig,
        perception: &PerceptionConfig,
        locomotion_config: &LocomotionConfig,
        pose: &Pose,
        health: &Health,
        spawn: &Spawn,
        graph: &TileGraph,
        locomotion: &mut LocomotionController,
        raycaster: &dyn ObstacleRaycaster,
        events: &mut EventQueue,
        rng: &mut R,
        inputs: &TickInputs,
    ) -> TickOutput {
        // 1. Death is terminal and reported exactly once
        if !health.is_alive() {
            self.state = BehaviorState::Dead;
            if !self.death_reported {
                self.death_reported = true;
                locomotion.clear_destination();
                events.push(AgentEvent::Died {
                    entity,
                    killer: health.last_hit_by,
                });
            }
            return TickOutput::stationary(BehaviorState::Dead, pose.facing);
        }

        // 2. External pause freezes the agent without touching its plans
        if inputs.signals.pause_movement {
            self.state = BehaviorState::Idle;
            return TickOutput::stationary(BehaviorState::Idle, pose.facing);
        }

        // 3. A zero movement speed would stall every distance computation
        if locomotion_config.base_speed <= 0.0 {
            warn!("agent {entity:?} has zero base speed, idling");
            self.state = BehaviorState::Idle;
            return TickOutput::stationary(BehaviorState::Idle, pose.facing);
        }

        // 4. Target maintenance: drop dead targets, roll acquisition
        let mut pursuit = None;
        if self.target.is_some() {
            match inputs.current_target {
                Some(snapshot) => pursuit = Some(snapshot),
                None => self.target = None,
            }
        }
        if self.target.is_none() {
            if let Some(candidate) = inputs.nearest {
                let distance = pose.position.distance(candidate.position);
                if distance <= perception.max_range()
                    && perception.detect(pose, candidate.position, candidate.velocity, rng)
                {
                    self.target = Some(candidate.entity);
                    pursuit = Some(candidate);
                    events.push(AgentEvent::TargetAcquired {
                        entity,
                        target: candidate.entity,
                    });
                }
            }
        }

        // 5. An animation hold pre-empts everything below
        if let Some(output) = self.advance_hold(inputs.dt, pose.facing) {
            return output;
        }

        // 6. Interactions and attacks start when in range and facing
        let interact_snapshot = self
            .interact_target
            .and_then(|assigned| inputs.interact.filter(|s| s.entity == assigned));
        if let Some(snapshot) = interact_snapshot {
            if self.within_reach(perception, locomotion_config, pose, snapshot.position) {
                self.hold = Some(Hold::Touch {
                    remaining: config.interact_duration,
                });
                locomotion.clear_destination();
                self.reset_route();
                self.state = BehaviorState::Touch;
                return TickOutput::stationary(BehaviorState::Touch, pose.facing);
            }
        }
        if let Some(snapshot) = pursuit {
            if self.within_reach(perception, locomotion_config, pose, snapshot.position) {
                let amount = rng.gen_range(config.damage_min..=config.damage_max);
                self.hold = Some(Hold::Attack {
                    remaining: config.attack_duration,
                });
                locomotion.clear_destination();
                self.reset_route();
                self.state = BehaviorState::Attack;
                return TickOutput {
                    state: BehaviorState::Attack,
                    command: MotionCommand::halt(pose.facing),
                    damage: Some(DamageIntent {
                        target: snapshot.entity,
                        amount,
                    }),
                };
            }
        }

        // 7. Idle dwell and wander-point selection, only while untasked
        if pursuit.is_none() && interact_snapshot.is_none() {
            if let Some(point) = self.wander_point {
                if horizontal_distance(pose.position, point) <= locomotion_config.arrival_radius {
                    self.wander_point = None;
                    self.reset_route();
                    locomotion.clear_destination();
                }
            }
            if self.wander_point.is_none() {
                let duration = *self.idle_duration.get_or_insert_with(|| {
                    rng.gen_range(config.idle_duration_min..=config.idle_duration_max)
                });
                self.idle_timer += inputs.dt;
                if self.idle_timer < duration {
                    self.state = BehaviorState::Idle;
                    return TickOutput::stationary(BehaviorState::Idle, pose.facing);
                }
                // Dwell expired: redraw it and pick where to wander next
                self.idle_timer = 0.0;
                self.idle_duration = Some(
                    rng.gen_range(config.idle_duration_min..=config.idle_duration_max),
                );
                let anchor = match config.wander_anchor {
                    WanderAnchor::Spawn => spawn.0,
                    WanderAnchor::CurrentPosition => pose.position,
                };
                let extents = config.wander_half_extents;
                self.wander_point = Some(Vec3::new(
                    anchor.x + rng.gen_range(-extents.x..=extents.x),
                    pose.position.y,
                    anchor.z + rng.gen_range(-extents.y..=extents.y),
                ));
            }
        }

        // 8. Destination: interact > pursuit (re-aimed every tick) > wander
        let desired = interact_snapshot
            .or(pursuit)
            .map(|s| s.position)
            .or(self.wander_point);
        let Some(desired) = desired else {
            self.state = BehaviorState::Idle;
            return TickOutput::stationary(BehaviorState::Idle, pose.facing);
        };
        self.refresh_route(graph, locomotion_config, pose, desired);
        let steer_to = self.current_waypoint().unwrap_or(desired);
        locomotion.set_destination(steer_to);

        // 9. Steering
        let speed = if pursuit.is_some() {
            locomotion_config.base_speed * locomotion_config.run_multiplier
        } else {
            locomotion_config.base_speed
        };
        let command = locomotion.tick(locomotion_config, pose, speed, inputs.dt, raycaster);

        // 10. Exhausted stuck recovery abandons the whole errand
        if locomotion.is_exhausted(locomotion_config) {
            let destination = locomotion.destination().unwrap_or(desired);
            events.push(AgentEvent::DestinationAbandoned {
                entity,
                destination,
            });
            locomotion.clear_destination();
            self.wander_point = None;
            self.target = None;
            self.reset_route();
            self.state = BehaviorState::Idle;
            return TickOutput::stationary(BehaviorState::Idle, pose.facing);
        }

        // 11. Resolve the movement state; airborne signals override
        let mut state = if command.is_moving() {
            if pursuit.is_some() {
                BehaviorState::Run
            } else {
                BehaviorState::Walk
            }
        } else {
            BehaviorState::Idle
        };
        if inputs.signals.jump {
            state = BehaviorState::Jumping;
        } else if !inputs.signals.grounded {
            state = BehaviorState::Falling;
        }
        self.state = state;

        TickOutput {
            state,
            command,
            damage: None,
        }
    }

    /// Advance an attack/touch hold, returning the forced output while one
    /// is active
    fn advance_hold(&mut self, dt: f32, facing: Vec3) -> Option<TickOutput> {
        match self.hold.take()? {
            Hold::Attack { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.hold = Some(Hold::Attack { remaining });
                    self.state = BehaviorState::Attack;
                    return Some(TickOutput::stationary(BehaviorState::Attack, facing));
                }
                // Animation done; re-evaluate the rest of the tick
                None
            }
            Hold::Touch { remaining } => {
                let remaining = remaining - dt;
                self.hold = if remaining > 0.0 {
                    Some(Hold::Touch { remaining })
                } else {
                    Some(Hold::Touchdown)
                };
                self.state = BehaviorState::Touch;
                Some(TickOutput::stationary(BehaviorState::Touch, facing))
            }
            Hold::Touchdown => {
                self.interact_target = None;
                self.state = BehaviorState::Touchdown;
                Some(TickOutput::stationary(BehaviorState::Touchdown, facing))
            }
        }
    }

    fn within_reach(
        &self,
        perception: &PerceptionConfig,
        locomotion_config: &LocomotionConfig,
        pose: &Pose,
        position: Vec3,
    ) -> bool {
        pose.position.distance(position) <= perception.attack_range
            && is_facing(pose, position, locomotion_config.facing_threshold)
    }

    /// Recompute the waypoint route when the goal tile changed, and advance
    /// past waypoints already reached
    fn refresh_route(
        &mut self,
        graph: &TileGraph,
        locomotion_config: &LocomotionConfig,
        pose: &Pose,
        desired: Vec3,
    ) {
        let goal = graph.world_to_coord(desired);
        if self.path_goal != Some(goal) {
            let start = graph.world_to_coord(pose.position);
            let path = find_path(graph, start, goal);
            self.waypoints = path.waypoints(graph);
            self.waypoint_index = 0;
            self.path_goal = Some(goal);
        }
        while self.waypoint_index < self.waypoints.len()
            && horizontal_distance(pose.position, self.waypoints[self.waypoint_index])
                <= locomotion_config.arrival_radius
        {
            self.waypoint_index += 1;
        }
    }

    /// Next intermediate waypoint; `None` on the final leg (or with no
    /// route), where steering aims at the exact desired point instead of a
    /// tile center
    fn current_waypoint(&self) -> Option<Vec3> {
        if self.waypoint_index + 1 < self.waypoints.len() {
            Some(self.waypoints[self.waypoint_index])
        } else {
            None
        }
    }

    fn reset_route(&mut self) {
        self.waypoints.clear();
        self.waypoint_index = 0;
        self.path_goal = None;
    }
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let d = b - a;
    (d.x * d.x + d.z * d.z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphConfig, TerrainBounds};
    use crate::world::{HeightSampler, OccupancyOracle, ObstacleRaycaster, OverlapHit, RayHit};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct FlatGround;

    impl HeightSampler for FlatGround {
        fn sample_height(&self, _x: f32, _z: f32) -> f32 {
            0.0
        }
    }

    struct Unoccupied;

    impl OccupancyOracle for Unoccupied {
        fn overlaps(&self, _center: Vec3, _half_extents: Vec3) -> Vec<OverlapHit> {
            Vec::new()
        }
    }

    struct NoObstacles;

    impl ObstacleRaycaster for NoObstacles {
        fn cast(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<RayHit> {
            None
        }
    }

    struct Fixture {
        graph: TileGraph,
        config: BehaviorConfig,
        perception: PerceptionConfig,
        locomotion_config: LocomotionConfig,
        controller: BehaviorController,
        locomotion: LocomotionController,
        events: EventQueue,
        rng: ChaCha8Rng,
        entity: Entity,
        other: Entity,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = hecs::World::new();
            let entity = world.spawn(());
            let other = world.spawn(());
            Self {
                graph: TileGraph::build(
                    TerrainBounds::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 10.0)),
                    &GraphConfig::default(),
                    &FlatGround,
                    &Unoccupied,
                )
                .unwrap(),
                config: BehaviorConfig::default(),
                perception: PerceptionConfig::default(),
                locomotion_config: LocomotionConfig::default(),
                controller: BehaviorController::new(),
                locomotion: LocomotionController::new(),
                events: EventQueue::new(),
                rng: ChaCha8Rng::seed_from_u64(11),
                entity,
                other,
            }
        }

        fn tick(&mut self, pose: &Pose, health: &Health, inputs: &TickInputs) -> TickOutput {
            self.controller.tick(
                self.entity,
                &self.config,
                &self.perception,
                &self.locomotion_config,
                pose,
                health,
                &Spawn(Vec3::new(5.0, 0.1, 5.0)),
                &self.graph,
                &mut self.locomotion,
                &NoObstacles,
                &mut self.events,
                &mut self.rng,
                inputs,
            )
        }
    }

    fn inputs(dt: f32) -> TickInputs {
        TickInputs {
            dt,
            ..Default::default()
        }
    }

    fn snapshot(entity: Entity, position: Vec3) -> TargetSnapshot {
        TargetSnapshot {
            entity,
            position,
            velocity: Vec3::ZERO,
        }
    }

    #[test]
    fn test_dead_is_terminal_and_reports_once() {
        let mut fx = Fixture::new();
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        let mut health = Health::new(10.0);
        health.current = 0.0;
        health.last_hit_by = Some(fx.other);

        for _ in 0..3 {
            let output = fx.tick(&pose, &health, &inputs(0.1));
            assert_eq!(output.state, BehaviorState::Dead);
            assert!(!output.command.is_moving());
        }

        fx.events.swap();
        let deaths = fx
            .events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Died { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_pause_freezes_to_idle() {
        let mut fx = Fixture::new();
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        let health = Health::new(10.0);
        let paused = TickInputs {
            dt: 0.1,
            signals: ExternalSignals {
                pause_movement: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let output = fx.tick(&pose, &health, &paused);
        assert_eq!(output.state, BehaviorState::Idle);
        assert!(!output.command.is_moving());
    }

    #[test]
    fn test_zero_speed_guard_returns_idle() {
        let mut fx = Fixture::new();
        fx.locomotion_config.base_speed = 0.0;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);

        let output = fx.tick(&pose, &Health::new(10.0), &inputs(0.1));
        assert_eq!(output.state, BehaviorState::Idle);
    }

    #[test]
    fn test_detection_acquires_target() {
        let mut fx = Fixture::new();
        fx.perception.base_chance = 100.0;
        fx.perception.set_sight_weight(100.0);
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);

        // Target on top of the observer: chance saturates at 100, so the
        // draw always succeeds
        let ticks = TickInputs {
            dt: 0.1,
            nearest: Some(snapshot(fx.other, pose.position)),
            ..Default::default()
        };
        fx.tick(&pose, &Health::new(10.0), &ticks);

        assert_eq!(fx.controller.target(), Some(fx.other));
        fx.events.swap();
        assert!(fx
            .events
            .iter()
            .any(|e| matches!(e, AgentEvent::TargetAcquired { .. })));
    }

    #[test]
    fn test_attack_in_range_deals_bounded_damage() {
        let mut fx = Fixture::new();
        fx.config.damage_min = 2.0;
        fx.config.damage_max = 4.0;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        fx.controller.target = Some(fx.other);

        let target_position = pose.position + Vec3::new(0.0, 0.0, 1.0);
        let ticks = TickInputs {
            dt: 0.1,
            current_target: Some(snapshot(fx.other, target_position)),
            ..Default::default()
        };
        let output = fx.tick(&pose, &Health::new(10.0), &ticks);

        assert_eq!(output.state, BehaviorState::Attack);
        let damage = output.damage.expect("attack should deal damage");
        assert_eq!(damage.target, fx.other);
        assert!((2.0..=4.0).contains(&damage.amount));
    }

    #[test]
    fn test_attack_hold_blocks_reattack() {
        let mut fx = Fixture::new();
        fx.config.attack_duration = 1.0;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        fx.controller.target = Some(fx.other);

        let ticks = TickInputs {
            dt: 0.1,
            current_target: Some(snapshot(fx.other, pose.position + Vec3::Z)),
            ..Default::default()
        };
        let first = fx.tick(&pose, &Health::new(10.0), &ticks);
        assert!(first.damage.is_some());

        // Mid-animation: still Attack, no second damage roll
        let second = fx.tick(&pose, &Health::new(10.0), &ticks);
        assert_eq!(second.state, BehaviorState::Attack);
        assert!(second.damage.is_none());
    }

    #[test]
    fn test_attack_requires_facing() {
        let mut fx = Fixture::new();
        // Looking away from the target
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), -Vec3::Z);
        fx.controller.target = Some(fx.other);

        let ticks = TickInputs {
            dt: 0.01,
            current_target: Some(snapshot(fx.other, pose.position + Vec3::Z)),
            ..Default::default()
        };
        let output = fx.tick(&pose, &Health::new(10.0), &ticks);
        assert_ne!(output.state, BehaviorState::Attack);
        assert!(output.damage.is_none());
    }

    #[test]
    fn test_idle_dwell_holds_until_expiry() {
        let mut fx = Fixture::new();
        fx.config.idle_duration_min = 5.0;
        fx.config.idle_duration_max = 5.0;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        let health = Health::new(10.0);

        // Under the threshold the state never leaves Idle and no wander
        // point is chosen
        for _ in 0..4 {
            let output = fx.tick(&pose, &health, &inputs(1.0));
            assert_eq!(output.state, BehaviorState::Idle);
            assert!(fx.controller.wander_point.is_none());
        }

        // Expiry: a wander destination appears
        fx.tick(&pose, &health, &inputs(1.0));
        assert!(fx.controller.wander_point.is_some());
    }

    #[test]
    fn test_wander_point_is_tethered_to_spawn() {
        let mut fx = Fixture::new();
        fx.config.wander_anchor = WanderAnchor::Spawn;
        fx.config.wander_half_extents = Vec2::new(2.0, 3.0);
        fx.config.idle_duration_min = 0.0;
        fx.config.idle_duration_max = 0.0;
        let pose = Pose::new(Vec3::new(1.0, 0.1, 1.0), Vec3::Z);

        fx.tick(&pose, &Health::new(10.0), &inputs(0.1));
        let point = fx.controller.wander_point.expect("wander point chosen");
        // Spawn is (5, 0.1, 5)
        assert!((point.x - 5.0).abs() <= 2.0);
        assert!((point.z - 5.0).abs() <= 3.0);
    }

    #[test]
    fn test_pursuit_moves_at_run() {
        let mut fx = Fixture::new();
        fx.perception.attack_range = 0.5;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 1.0), Vec3::Z);
        fx.controller.target = Some(fx.other);

        let ticks = TickInputs {
            dt: 0.1,
            current_target: Some(snapshot(fx.other, Vec3::new(5.0, 0.1, 8.0))),
            ..Default::default()
        };
        let output = fx.tick(&pose, &Health::new(10.0), &ticks);

        assert_eq!(output.state, BehaviorState::Run);
        let run_speed = fx.locomotion_config.base_speed * fx.locomotion_config.run_multiplier;
        assert!((output.command.velocity.length() - run_speed).abs() < 1e-4);
    }

    #[test]
    fn test_airborne_overrides_movement_state() {
        let mut fx = Fixture::new();
        fx.perception.attack_range = 0.5;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 1.0), Vec3::Z);
        fx.controller.target = Some(fx.other);
        let target = Some(snapshot(fx.other, Vec3::new(5.0, 0.1, 8.0)));

        let falling = TickInputs {
            dt: 0.1,
            signals: ExternalSignals {
                grounded: false,
                ..Default::default()
            },
            current_target: target,
            ..Default::default()
        };
        assert_eq!(
            fx.tick(&pose, &Health::new(10.0), &falling).state,
            BehaviorState::Falling
        );

        let jumping = TickInputs {
            dt: 0.1,
            signals: ExternalSignals {
                jump: true,
                ..Default::default()
            },
            current_target: target,
            ..Default::default()
        };
        assert_eq!(
            fx.tick(&pose, &Health::new(10.0), &jumping).state,
            BehaviorState::Jumping
        );
    }

    #[test]
    fn test_stuck_pursuit_abandons_exactly_once() {
        let mut fx = Fixture::new();
        fx.perception.attack_range = 0.5;
        fx.locomotion_config.stuck_check_interval = 0.25;
        fx.locomotion_config.max_stuck_reports = 2;
        // Keep the agent idling after the abandonment
        fx.config.idle_duration_min = 100.0;
        fx.config.idle_duration_max = 100.0;

        let pose = Pose::new(Vec3::new(5.0, 0.1, 1.0), Vec3::Z);
        let health = Health::new(10.0);
        fx.controller.target = Some(fx.other);
        let ticks = TickInputs {
            dt: 0.25,
            current_target: Some(snapshot(fx.other, Vec3::new(5.0, 0.1, 8.0))),
            ..Default::default()
        };

        // Position never changes, so recovery exhausts and the errand is
        // dropped; afterwards the cleared target keeps the agent idle
        let mut saw_abandon = false;
        for _ in 0..40 {
            fx.tick(&pose, &health, &ticks);
            if fx.controller.target().is_none() {
                saw_abandon = true;
                break;
            }
        }
        assert!(saw_abandon);

        for _ in 0..20 {
            // current_target no longer matters once the target is cleared
            assert_eq!(fx.tick(&pose, &health, &inputs(0.25)).state, BehaviorState::Idle);
        }

        fx.events.swap();
        let abandoned = fx
            .events
            .iter()
            .filter(|e| matches!(e, AgentEvent::DestinationAbandoned { .. }))
            .count();
        assert_eq!(abandoned, 1);
    }

    #[test]
    fn test_interact_runs_touch_then_touchdown() {
        let mut fx = Fixture::new();
        fx.config.interact_duration = 0.2;
        let pose = Pose::new(Vec3::new(5.0, 0.1, 5.0), Vec3::Z);
        let health = Health::new(10.0);
        fx.controller.set_interact_target(Some(fx.other));

        let ticks = TickInputs {
            dt: 0.1,
            interact: Some(snapshot(fx.other, pose.position + Vec3::Z)),
            ..Default::default()
        };

        let mut states = Vec::new();
        for _ in 0..4 {
            states.push(fx.tick(&pose, &health, &ticks).state);
        }
        assert_eq!(
            states,
            vec![
                BehaviorState::Touch,
                BehaviorState::Touch,
                BehaviorState::Touch,
                BehaviorState::Touchdown,
            ]
        );
        assert!(fx.controller.interact_target().is_none());
    }
}
